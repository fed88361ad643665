//! WGSL loading, compilation and stage linking.
//!
//! Sources are parsed and validated with `naga` before wgpu ever sees them, so
//! a bad shader becomes a [`ShaderError`] carrying the diagnostic text instead
//! of a device-level validation panic. Linking checks what a GL program link
//! would: entry points, the vertex to fragment interface, the resource slots
//! the host binds, and the channel type of the color target.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

use crate::error::codes;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Vertex input locations fed by `QuadVertex::layout()`.
pub const VERTEX_ATTRIBUTE_LOCATIONS: &[u32] = &[0];

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile {name}:\n{log}")]
    Compile { name: String, log: String },

    #[error("failed to link program `{program}`: {log}")]
    Link { program: String, log: String },
}

impl ShaderError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ShaderError::Io { .. } => codes::SHADER_READ,
            ShaderError::Compile { .. } => codes::SHADER_COMPILE,
            ShaderError::Link { .. } => codes::SHADER_LINK,
        }
    }
}

/// Named WGSL text.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub name: String,
    pub code: String,
}

impl ShaderSource {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Reads `dir/name`.
    pub fn load(dir: &Path, name: &str) -> Result<Self, ShaderError> {
        let path = dir.join(name);
        let code = std::fs::read_to_string(&path).map_err(|source| ShaderError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self::new(name, code))
    }

    /// Parses and validates the source.
    pub fn compile(self) -> Result<CompiledShader, ShaderError> {
        log::debug!("compiling {}", self.name);

        let module = match wgsl::parse_str(&self.code) {
            Ok(module) => module,
            Err(err) => {
                return Err(ShaderError::Compile {
                    log: err.emit_to_string(&self.code),
                    name: self.name,
                });
            }
        };

        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        if let Err(err) = validator.validate(&module) {
            return Err(ShaderError::Compile {
                log: error_chain(&err),
                name: self.name,
            });
        }

        Ok(CompiledShader {
            source: self,
            module,
        })
    }
}

/// Validated shader plus its IR.
#[derive(Debug)]
pub struct CompiledShader {
    source: ShaderSource,
    module: naga::Module,
}

impl CompiledShader {
    pub fn name(&self) -> &str {
        &self.source.name
    }

    fn entry_point(&self, stage: naga::ShaderStage, name: &str) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage && ep.name == name)
    }

    fn resource(&self, group: u32, binding: u32) -> Option<&naga::GlobalVariable> {
        self.module.global_variables.iter().find_map(|(_, var)| {
            let rb = var.binding.as_ref()?;
            (rb.group == group && rb.binding == binding).then_some(var)
        })
    }
}

/// Channel type of a texture or color target, as the shader sees it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorKind {
    Float,
    Uint,
}

impl ColorKind {
    fn matches(self, kind: naga::ScalarKind) -> bool {
        matches!(
            (self, kind),
            (ColorKind::Float, naga::ScalarKind::Float) | (ColorKind::Uint, naga::ScalarKind::Uint)
        )
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    /// A single-sampled 2D texture with texels of the given kind.
    Texture(ColorKind),
    Uniform,
}

/// A resource the host binds for the fragment stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResourceSlot {
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
}

impl ResourceSlot {
    pub const fn texture(group: u32, binding: u32, texels: ColorKind) -> Self {
        Self {
            group,
            binding,
            kind: ResourceKind::Texture(texels),
        }
    }

    pub const fn uniform(group: u32, binding: u32) -> Self {
        Self {
            group,
            binding,
            kind: ResourceKind::Uniform,
        }
    }
}

/// A vertex/fragment pair whose stages were checked against each other.
#[derive(Debug)]
pub struct LinkedProgram {
    label: String,
    vertex: CompiledShader,
    fragment: CompiledShader,
}

impl LinkedProgram {
    /// `target` is the channel type of the color attachment at location 0.
    pub fn link(
        label: impl Into<String>,
        vertex: CompiledShader,
        fragment: CompiledShader,
        resources: &[ResourceSlot],
        target: ColorKind,
    ) -> Result<Self, ShaderError> {
        let label = label.into();
        let fail = |log: String| ShaderError::Link {
            program: label.clone(),
            log,
        };

        let vs = vertex
            .entry_point(naga::ShaderStage::Vertex, VERTEX_ENTRY)
            .ok_or_else(|| fail(format!("{} has no vertex entry point `{VERTEX_ENTRY}`", vertex.name())))?;
        let fs = fragment
            .entry_point(naga::ShaderStage::Fragment, FRAGMENT_ENTRY)
            .ok_or_else(|| {
                fail(format!("{} has no fragment entry point `{FRAGMENT_ENTRY}`", fragment.name()))
            })?;

        for location in argument_locations(&vertex.module, &vs.function) {
            if !VERTEX_ATTRIBUTE_LOCATIONS.contains(&location) {
                return Err(fail(format!(
                    "{} reads vertex attribute {location}, which no buffer provides",
                    vertex.name()
                )));
            }
        }

        let outputs = result_locations(&vertex.module, &vs.function);
        for location in argument_locations(&fragment.module, &fs.function) {
            if !outputs.iter().any(|&(l, _)| l == location) {
                return Err(fail(format!(
                    "{} reads location {location}, which {} does not write",
                    fragment.name(),
                    vertex.name()
                )));
            }
        }

        let color = result_locations(&fragment.module, &fs.function)
            .into_iter()
            .find(|&(l, _)| l == 0)
            .ok_or_else(|| fail(format!("{} writes no color at location 0", fragment.name())))?;
        match scalar_kind(&fragment.module, color.1) {
            Some(kind) if target.matches(kind) => {}
            found => {
                return Err(fail(format!(
                    "{} writes {found:?} at location 0, the target expects {target:?}",
                    fragment.name()
                )));
            }
        }

        for slot in resources {
            let Some(var) = fragment.resource(slot.group, slot.binding) else {
                return Err(fail(format!(
                    "{} declares nothing at @group({}) @binding({})",
                    fragment.name(),
                    slot.group,
                    slot.binding
                )));
            };
            if !resource_matches(&fragment.module, var, slot.kind) {
                return Err(fail(format!(
                    "{} binds the wrong resource type at @group({}) @binding({}), expected {:?}",
                    fragment.name(),
                    slot.group,
                    slot.binding,
                    slot.kind
                )));
            }
        }

        Ok(Self {
            label,
            vertex,
            fragment,
        })
    }

    /// Reads, compiles and links `vertex` and `fragment` from `dir`.
    pub fn load(
        dir: &Path,
        label: &str,
        vertex: &str,
        fragment: &str,
        resources: &[ResourceSlot],
        target: ColorKind,
    ) -> Result<Self, ShaderError> {
        let vertex = ShaderSource::load(dir, vertex)?.compile()?;
        let fragment = ShaderSource::load(dir, fragment)?.compile()?;
        Self::link(label, vertex, fragment, resources, target)
    }

    /// Uploads both stages to the device.
    pub fn create_modules(&self, device: &wgpu::Device) -> ShaderProgram {
        log::debug!("creating shader modules for `{}`", self.label);
        let module = |shader: &CompiledShader| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(shader.name()),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&shader.source.code)),
            })
        };

        ShaderProgram {
            vertex: module(&self.vertex),
            fragment: module(&self.fragment),
        }
    }
}

/// Device-side modules of a [`LinkedProgram`].
pub struct ShaderProgram {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
}

impl ShaderProgram {
    pub fn vertex_state<'a>(
        &'a self,
        buffers: &'a [wgpu::VertexBufferLayout<'a>],
    ) -> wgpu::VertexState<'a> {
        wgpu::VertexState {
            module: &self.vertex,
            entry_point: Some(VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers,
        }
    }

    pub fn fragment_state<'a>(
        &'a self,
        targets: &'a [Option<wgpu::ColorTargetState>],
    ) -> wgpu::FragmentState<'a> {
        wgpu::FragmentState {
            module: &self.fragment,
            entry_point: Some(FRAGMENT_ENTRY),
            compilation_options: Default::default(),
            targets,
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut log = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        log.push_str(": ");
        log.push_str(&cause.to_string());
        source = cause.source();
    }
    log
}

/// User-defined locations of a binding and their types, looking through IO
/// structs.
fn locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<(u32, naga::Handle<naga::Type>)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push((*location, ty)),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

fn argument_locations(module: &naga::Module, function: &naga::Function) -> Vec<u32> {
    let mut out = Vec::new();
    for arg in &function.arguments {
        locations(module, arg.binding.as_ref(), arg.ty, &mut out);
    }
    out.into_iter().map(|(location, _)| location).collect()
}

fn result_locations(
    module: &naga::Module,
    function: &naga::Function,
) -> Vec<(u32, naga::Handle<naga::Type>)> {
    let mut out = Vec::new();
    if let Some(result) = &function.result {
        locations(module, result.binding.as_ref(), result.ty, &mut out);
    }
    out
}

fn scalar_kind(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Option<naga::ScalarKind> {
    match module.types[ty].inner {
        naga::TypeInner::Scalar(scalar) | naga::TypeInner::Vector { scalar, .. } => Some(scalar.kind),
        _ => None,
    }
}

fn resource_matches(module: &naga::Module, var: &naga::GlobalVariable, kind: ResourceKind) -> bool {
    match kind {
        ResourceKind::Uniform => var.space == naga::AddressSpace::Uniform,
        ResourceKind::Texture(texels) => match module.types[var.ty].inner {
            naga::TypeInner::Image {
                dim: naga::ImageDimension::D2,
                arrayed: false,
                class: naga::ImageClass::Sampled { kind, multi: false },
            } => texels.matches(kind),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SANDPILE_VERT: &str = include_str!("../../shaders/sandpile.vert.wgsl");
    const SANDPILE_FRAG: &str = include_str!("../../shaders/sandpile.frag.wgsl");
    const DISPLAY_VERT: &str = include_str!("../../shaders/display.vert.wgsl");
    const DISPLAY_FRAG: &str = include_str!("../../shaders/display.frag.wgsl");

    const SLOTS: [ResourceSlot; 2] = [
        ResourceSlot::texture(0, 0, ColorKind::Uint),
        ResourceSlot::uniform(0, 1),
    ];

    fn compile(name: &str, code: &str) -> CompiledShader {
        ShaderSource::new(name, code).compile().unwrap()
    }

    fn link_to(vs: &str, fs: &str, target: ColorKind) -> Result<LinkedProgram, ShaderError> {
        LinkedProgram::link(
            "test",
            compile("test.vert", vs),
            compile("test.frag", fs),
            &SLOTS,
            target,
        )
    }

    fn link(vs: &str, fs: &str) -> Result<LinkedProgram, ShaderError> {
        link_to(vs, fs, ColorKind::Uint)
    }

    fn link_log(result: Result<LinkedProgram, ShaderError>) -> String {
        match result {
            Err(ShaderError::Link { program, log }) => {
                assert_eq!(program, "test");
                log
            }
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn shipped_sandpile_program_links() {
        link(SANDPILE_VERT, SANDPILE_FRAG).unwrap();
    }

    #[test]
    fn shipped_display_program_links() {
        link_to(DISPLAY_VERT, DISPLAY_FRAG, ColorKind::Float).unwrap();
    }

    #[test]
    fn shipped_shaders_load_from_disk() {
        let dir = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders"));
        let program = LinkedProgram::load(
            dir,
            "sandpile",
            "sandpile.vert.wgsl",
            "sandpile.frag.wgsl",
            &SLOTS,
            ColorKind::Uint,
        )
        .unwrap();
        assert_eq!(program.label, "sandpile");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ShaderSource::load(Path::new("/nonexistent"), "nope.wgsl").unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
        assert_eq!(err.exit_code(), codes::SHADER_READ);
    }

    #[test]
    fn syntax_error_reports_diagnostic() {
        let err = ShaderSource::new("broken.wgsl", "@fragment fn fs_main( -> {")
            .compile()
            .unwrap_err();
        match &err {
            ShaderError::Compile { name, log } => {
                assert_eq!(name, "broken.wgsl");
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
        assert!(err.to_string().contains("broken.wgsl"));
        assert_eq!(err.exit_code(), codes::SHADER_COMPILE);
    }

    #[test]
    fn type_error_fails_validation() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { let x: u32 = 1.5; return vec4<f32>(0.0); }";
        let err = ShaderSource::new("types.wgsl", src).compile().unwrap_err();
        assert!(matches!(err, ShaderError::Compile { .. }));
    }

    #[test]
    fn mismatched_interface_fails_to_link() {
        let fs = DISPLAY_FRAG.replace("@location(0) uv", "@location(3) uv");
        let log = link_log(link_to(DISPLAY_VERT, &fs, ColorKind::Float));
        assert!(log.contains("location 3"), "{log}");
    }

    #[test]
    fn missing_uniform_fails_to_link() {
        let fs = "
            @group(0) @binding(0) var state: texture_2d<u32>;
            @fragment
            fn fs_main(@builtin(position) p: vec4<f32>) -> @location(0) vec4<u32> {
                return textureLoad(state, vec2<i32>(p.xy), 0);
            }
        ";
        let log = link_log(link(SANDPILE_VERT, fs));
        assert!(log.contains("@binding(1)"), "{log}");
    }

    #[test]
    fn float_state_texture_fails_to_link() {
        let fs = "
            @group(0) @binding(0) var state: texture_2d<f32>;
            @group(0) @binding(1) var<uniform> dim: vec2<f32>;
            @fragment
            fn fs_main(@builtin(position) p: vec4<f32>) -> @location(0) vec4<u32> {
                return vec4<u32>(textureLoad(state, vec2<i32>(p.xy), 0));
            }
        ";
        let log = link_log(link(SANDPILE_VERT, fs));
        assert!(log.contains("@binding(0)"), "{log}");
    }

    #[test]
    fn float_output_into_integer_target_fails_to_link() {
        let fs = "
            @group(0) @binding(0) var state: texture_2d<u32>;
            @group(0) @binding(1) var<uniform> dim: vec2<f32>;
            @fragment
            fn fs_main(@builtin(position) p: vec4<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(textureLoad(state, vec2<i32>(p.xy), 0));
            }
        ";
        let log = link_log(link(SANDPILE_VERT, fs));
        assert!(log.contains("Uint"), "{log}");
    }

    #[test]
    fn display_shader_into_integer_target_fails_to_link() {
        let log = link_log(link_to(DISPLAY_VERT, DISPLAY_FRAG, ColorKind::Uint));
        assert!(log.contains("location 0"), "{log}");
    }

    #[test]
    fn wrong_entry_point_fails_to_link() {
        let vs = SANDPILE_VERT.replace("vs_main", "main");
        let log = link_log(link(&vs, SANDPILE_FRAG));
        assert!(log.contains(VERTEX_ENTRY), "{log}");
    }

    #[test]
    fn unknown_vertex_attribute_fails_to_link() {
        let vs = SANDPILE_VERT.replace("@location(0) pos", "@location(2) pos");
        let log = link_log(link(&vs, SANDPILE_FRAG));
        assert!(log.contains("attribute 2"), "{log}");
    }
}
