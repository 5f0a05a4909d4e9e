//! WAV file export functionality
//!
//! Renders a programmed speaker to a mono 16-bit WAV file. Useful for
//! capturing beeps and effects offline without an audio device.

use std::path::Path;

use crate::speaker::PcSpeaker;
use crate::{Result, SpeakerError};

/// Render `duration_ms` emulated milliseconds of speaker output into a WAV
/// file at `output_path`.
///
/// The speaker keeps whatever PIT programming it has; call the control
/// methods before exporting.
///
/// # Examples
///
/// ```no_run
/// use pcspeaker::{write_wav, PcSpeaker};
///
/// # fn main() -> pcspeaker::Result<()> {
/// let mut speaker = PcSpeaker::with_sample_rate(44_100);
/// speaker.set_counter(1193, 3, 0.0);
/// speaker.set_type(true, true, 0.0);
///
/// write_wav(&mut speaker, "beep.wav", 500)?;
/// # Ok(())
/// # }
/// ```
pub fn write_wav<P: AsRef<Path>>(
    speaker: &mut PcSpeaker,
    output_path: P,
    duration_ms: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: speaker.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(output_path.as_ref(), spec)
        .map_err(|e| SpeakerError::AudioFile(format!("failed to create WAV file: {e}")))?;

    let mut chunk = vec![0i16; speaker.samples_per_tick()];
    for _ in 0..duration_ms {
        speaker.render(&mut chunk);
        for &sample in &chunk {
            writer
                .write_sample(sample)
                .map_err(|e| SpeakerError::AudioFile(format!("failed to write sample: {e}")))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| SpeakerError::AudioFile(format!("failed to finalize WAV file: {e}")))?;

    tracing::info!(
        path = %output_path.as_ref().display(),
        duration_ms,
        "WAV export complete"
    );
    Ok(())
}
