use winit::dpi::PhysicalSize;

use super::{CapabilityError, SurfaceErrorAction};

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Sample count every device honours without adapter-specific features.
const GUARANTEED_SAMPLE_COUNT: u32 = 4;

/// Rejects a sample count the format cannot render and resolve with.
///
/// `flags` are the adapter's format features, which the device only honours
/// with `TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES`. Returns the features the
/// device must be requested with. `1` is always accepted; unsupported counts
/// are an error, never a downgrade.
pub(crate) fn check_sample_count(
    flags: wgpu::TextureFormatFeatureFlags,
    format: wgpu::TextureFormat,
    count: u32,
    adapter_features: wgpu::Features,
) -> Result<wgpu::Features, CapabilityError> {
    let specific = wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
    if count == 1 {
        return Ok(wgpu::Features::empty());
    }

    let unsupported = CapabilityError::UnsupportedSampleCount { count, format };
    if !flags.sample_count_supported(count)
        || !flags.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
    {
        return Err(unsupported);
    }

    if adapter_features.contains(specific) {
        Ok(specific)
    } else if count == GUARANTEED_SAMPLE_COUNT {
        Ok(wgpu::Features::empty())
    } else {
        Err(unsupported)
    }
}

/// Creates the multisampled color target matching the surface configuration.
///
/// Returns `None` when multisampling is disabled.
pub(crate) fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("sandpile msaa target"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

/// Applies a new drawable size.
///
/// Returns `true` when the surface was reconfigured. wgpu does not support
/// configuring a 0x0 surface; in that case only `size` is updated.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) -> bool {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return false;
    }

    config.width = new_size.width;
    config.height = new_size.height;

    surface.configure(device, config);
    true
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormatFeatureFlags as Flags;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    const SPECIFIC: wgpu::Features = wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
    const NONE: wgpu::Features = wgpu::Features::empty();

    fn is_unsupported(result: Result<wgpu::Features, CapabilityError>, expected: u32) -> bool {
        matches!(
            result,
            Err(CapabilityError::UnsupportedSampleCount { count, .. }) if count == expected
        )
    }

    #[test]
    fn single_sample_always_supported() {
        assert_eq!(check_sample_count(Flags::empty(), FORMAT, 1, NONE).unwrap(), NONE);
    }

    #[test]
    fn guaranteed_count_needs_no_extra_features() {
        let flags = Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_RESOLVE;
        assert_eq!(check_sample_count(flags, FORMAT, 4, NONE).unwrap(), NONE);
    }

    #[test]
    fn adapter_specific_flags_are_requested_when_available() {
        let flags = Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_X8 | Flags::MULTISAMPLE_RESOLVE;
        assert_eq!(check_sample_count(flags, FORMAT, 8, SPECIFIC).unwrap(), SPECIFIC);
        assert_eq!(check_sample_count(flags, FORMAT, 4, SPECIFIC).unwrap(), SPECIFIC);
    }

    #[test]
    fn unavailable_sample_count_is_fatal() {
        let flags = Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_RESOLVE;
        assert!(is_unsupported(check_sample_count(flags, FORMAT, 8, SPECIFIC), 8));
    }

    #[test]
    fn missing_resolve_is_fatal() {
        let flags = Flags::MULTISAMPLE_X4;
        assert!(is_unsupported(check_sample_count(flags, FORMAT, 4, NONE), 4));
        assert!(is_unsupported(check_sample_count(flags, FORMAT, 4, SPECIFIC), 4));
    }

    #[test]
    fn non_guaranteed_count_without_adapter_features_is_fatal() {
        let flags = Flags::MULTISAMPLE_X8 | Flags::MULTISAMPLE_RESOLVE;
        assert!(is_unsupported(check_sample_count(flags, FORMAT, 8, NONE), 8));

        let flags = Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_RESOLVE;
        assert!(is_unsupported(check_sample_count(flags, FORMAT, 2, NONE), 2));
    }

    #[test]
    fn non_power_of_two_sample_count_is_fatal() {
        let flags = Flags::MULTISAMPLE_X2
            | Flags::MULTISAMPLE_X4
            | Flags::MULTISAMPLE_X8
            | Flags::MULTISAMPLE_RESOLVE;
        assert!(is_unsupported(check_sample_count(flags, FORMAT, 3, SPECIFIC), 3));
    }

    fn caps(formats: Vec<wgpu::TextureFormat>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            ..Default::default()
        }
    }

    #[test]
    fn prefers_srgb_when_available() {
        let c = caps(vec![
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ]);
        assert_eq!(
            choose_surface_format(&c, true),
            Some(wgpu::TextureFormat::Bgra8UnormSrgb)
        );
        assert_eq!(
            choose_surface_format(&c, false),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    #[test]
    fn no_formats_yields_none() {
        assert_eq!(choose_surface_format(&caps(Vec::new()), true), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let c = caps(vec![FORMAT]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
    }
}
