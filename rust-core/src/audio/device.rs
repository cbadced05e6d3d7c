//! Audio device enumeration and stream configuration selection

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, SampleRate, SupportedStreamConfig, SupportedStreamConfigRange};

use crate::error::{AudioError, Result};

/// Audio device information
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDeviceInfo {
    pub name: String,
    /// Position in the host's device list, stable while devices are unchanged
    pub index: usize,
    pub max_input_channels: u16,
    pub max_output_channels: u16,
}

fn max_channels<I>(configs: std::result::Result<I, cpal::SupportedStreamConfigsError>) -> u16
where
    I: Iterator<Item = SupportedStreamConfigRange>,
{
    configs
        .map(|cs| cs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

/// Describe every device of the default host
pub fn list_devices() -> Result<Vec<AudioDeviceInfo>> {
    let host = cpal::default_host();
    let devices = host
        .devices()
        .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

    let mut result = Vec::new();
    for (index, device) in devices.enumerate() {
        let name = match device.name() {
            Ok(name) => name,
            Err(e) => {
                log::debug!("Skipping device {} without a name: {}", index, e);
                continue;
            }
        };

        result.push(AudioDeviceInfo {
            name,
            index,
            max_input_channels: max_channels(device.supported_input_configs()),
            max_output_channels: max_channels(device.supported_output_configs()),
        });
    }

    Ok(result)
}

/// Devices that can capture audio
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>> {
    Ok(capture_capable(list_devices()?))
}

/// Keep only devices with at least one input channel
pub fn capture_capable(devices: Vec<AudioDeviceInfo>) -> Vec<AudioDeviceInfo> {
    devices
        .into_iter()
        .filter(|d| d.max_input_channels > 0)
        .collect()
}

/// Look a device up by its `AudioDeviceInfo::index`
pub fn device_by_index(index: usize) -> Result<Device> {
    let host = cpal::default_host();
    host.devices()
        .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?
        .nth(index)
        .ok_or_else(|| AudioError::DeviceUnavailable(format!("no device at index {}", index)))
}

/// Default output device of the default host
pub fn default_output_device() -> Result<Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no default output device".to_string()))
}

/// Pick a supported configuration running at `sample_rate`
///
/// Prefers a range with exactly `channels` channels, then the smallest
/// channel count above it. Returns `None` when no range covers the rate.
pub fn select_stream_config(
    ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
    sample_rate: u32,
    channels: u16,
) -> Option<SupportedStreamConfig> {
    let rate = SampleRate(sample_rate);
    ranges
        .into_iter()
        .filter(|r| r.channels() >= channels)
        .filter(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
        .min_by_key(|r| r.channels())
        .map(|r| r.with_sample_rate(rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleFormat, SupportedBufferSize};

    fn range(channels: u16, min: u32, max: u32) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            SampleFormat::F32,
        )
    }

    #[test]
    fn test_capture_capable_filters_outputs() {
        let devices = vec![
            AudioDeviceInfo {
                name: "Speakers".into(),
                index: 0,
                max_input_channels: 0,
                max_output_channels: 2,
            },
            AudioDeviceInfo {
                name: "Microphone".into(),
                index: 1,
                max_input_channels: 1,
                max_output_channels: 0,
            },
        ];

        let inputs = capture_capable(devices);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "Microphone");
        assert_eq!(inputs[0].index, 1);
    }

    #[test]
    fn test_select_prefers_mono() {
        let ranges = vec![range(2, 8000, 96000), range(1, 8000, 48000)];
        let config = select_stream_config(ranges, 44100, 1).unwrap();

        assert_eq!(config.channels(), 1);
        assert_eq!(config.sample_rate(), SampleRate(44100));
    }

    #[test]
    fn test_select_falls_back_to_wider_layout() {
        let ranges = vec![range(6, 44100, 44100), range(2, 44100, 48000)];
        let config = select_stream_config(ranges, 44100, 1).unwrap();

        assert_eq!(config.channels(), 2);
    }

    #[test]
    fn test_select_rejects_unsupported_rate() {
        let ranges = vec![range(2, 48000, 48000)];
        assert!(select_stream_config(ranges, 44100, 1).is_none());
    }

    #[test]
    fn test_list_devices() {
        // Just ensure it doesn't crash on machines without audio hardware
        let _ = list_input_devices();
    }
}
