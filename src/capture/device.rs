//! Default input device capture through CPAL

use super::{CaptureFormat, CaptureHandler};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, Stream, StreamConfig};

/// A running device capture stream
///
/// Capture runs while this value is alive; dropping it stops the stream.
pub struct DeviceSource {
    name: String,
    _stream: Stream,
}

impl DeviceSource {
    /// Open the default input device and start delivering i16 buffers to `handler`
    ///
    /// # Errors
    ///
    /// Returns `NoDevice` if there is no default input device,
    /// `UnsupportedFormat` if it cannot capture signed 16-bit samples at the
    /// requested rate and channel count, and `Backend` for anything CPAL
    /// reports while building or starting the stream.
    pub fn open_default<H>(format: &CaptureFormat, mut handler: H) -> Result<Self>
    where
        H: CaptureHandler + Send + 'static,
    {
        format.validate()?;

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(Error::NoDevice)?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::Backend(e.to_string()))?
            .any(|range| {
                range.sample_format() == SampleFormat::I16
                    && range.channels() == format.channels
                    && range.min_sample_rate().0 <= format.sample_rate
                    && format.sample_rate <= range.max_sample_rate().0
            });
        if !supported {
            return Err(Error::UnsupportedFormat {
                format: format!(
                    "{} Hz, {} channel(s), signed 16-bit on {}",
                    format.sample_rate, format.channels, name
                ),
            });
        }

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    // SAFETY: i16 has no padding, so its storage is valid as bytes
                    let bytes = unsafe {
                        std::slice::from_raw_parts(
                            data.as_ptr().cast::<u8>(),
                            std::mem::size_of_val(data),
                        )
                    };
                    handler.on_buffer(bytes);
                },
                |err| log::error!("capture stream error: {}", err),
                None,
            )
            .map_err(|e| Error::Backend(e.to_string()))?;

        stream.play().map_err(|e| Error::Backend(e.to_string()))?;
        log::info!(
            "capturing from '{}' at {} Hz, {} channel(s)",
            name,
            format.sample_rate,
            format.channels
        );

        Ok(Self {
            name,
            _stream: stream,
        })
    }

    /// Name of the capture device
    pub fn name(&self) -> &str {
        &self.name
    }
}
