/// MP3 decoder adapter using Symphonia
use crate::error::{AudioError, Result};
use crate::streamer::{Frame, StreamSeeker, Streamer};
use std::io::ErrorKind;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Open `path` as a seekable stereo stream
///
/// Shorthand for [`Mp3Decoder::open`].
pub fn decode(path: &Path) -> Result<Mp3Decoder> {
    Mp3Decoder::open(path)
}

/// Streaming MP3 decoder
///
/// Decodes one packet at a time as frames are pulled. Output is always
/// stereo: mono is duplicated to both channels, extra channels are dropped.
pub struct Mp3Decoder {
    /// Format reader (container parser)
    format: Box<dyn FormatReader>,
    /// Audio decoder
    decoder: Box<dyn Decoder>,
    /// Track ID
    track_id: u32,
    /// Sample rate
    sample_rate: u32,
    /// Total length in frames
    len: usize,
    /// Index of the next frame handed out by `stream`
    position: usize,
    /// Frames decoded from the current packet
    pending: Vec<Frame>,
    /// Frames of `pending` already handed out
    pending_offset: usize,
    /// Conversion scratch, reused across packets
    sample_buf: Option<SampleBuffer<f32>>,
    /// Error that ended the stream
    error: Option<AudioError>,
    /// Stream drained (end of file or fatal error)
    finished: bool,
}

impl Mp3Decoder {
    /// Probe `path` and prepare the default track for decoding
    ///
    /// # Errors
    /// `FileNotFound` if the path does not exist, `Symphonia`/`DecodeError`
    /// if the file is not a decodable MP3.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::Symphonia(format!("Failed to probe file: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| AudioError::DecodeError("No audio tracks found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| AudioError::DecodeError("Unknown sample rate".to_string()))?;
        let n_frames = track.codec_params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::Symphonia(format!("Failed to create decoder: {}", e)))?;

        let len = match n_frames {
            Some(n) => n as usize,
            None => scan_len(format.as_mut(), track_id)?,
        };

        tracing::debug!(
            path = %path.display(),
            sample_rate,
            len,
            "Opened MP3 stream"
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            len,
            position: 0,
            pending: Vec::new(),
            pending_offset: 0,
            sample_buf: None,
            error: None,
            finished: false,
        })
    }

    /// Native sample rate of the file
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode the next packet of our track into `pending`
    ///
    /// Returns `false` when the stream is over. Corrupt packets are skipped.
    fn decode_next(&mut self) -> bool {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    return false;
                }
                Err(e) => {
                    self.error = Some(e.into());
                    return false;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    append_frames(decoded, &mut self.sample_buf, &mut self.pending);
                    return true;
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    tracing::warn!("Skipping corrupt MP3 packet: {}", msg);
                }
                Err(e) => {
                    self.error = Some(e.into());
                    return false;
                }
            }
        }
    }

    fn clear_pending(&mut self) {
        self.pending.clear();
        self.pending_offset = 0;
    }
}

impl Streamer for Mp3Decoder {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        if self.finished {
            return (0, false);
        }

        let mut filled = 0;
        while filled < frames.len() {
            if self.pending_offset >= self.pending.len() {
                self.clear_pending();
                if !self.decode_next() {
                    self.finished = true;
                    break;
                }
                continue;
            }

            let available = &self.pending[self.pending_offset..];
            let n = available.len().min(frames.len() - filled);
            frames[filled..filled + n].copy_from_slice(&available[..n]);
            filled += n;
            self.pending_offset += n;
        }

        self.position += filled;
        (filled, !self.finished)
    }

    fn err(&self) -> Option<&AudioError> {
        self.error.as_ref()
    }
}

impl StreamSeeker for Mp3Decoder {
    fn len(&self) -> usize {
        self.len
    }

    fn position(&self) -> usize {
        self.position
    }

    fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.len {
            return Err(AudioError::SeekOutOfRange {
                position,
                len: self.len,
            });
        }

        self.clear_pending();
        self.error = None;

        if position == self.len {
            self.finished = true;
            self.position = position;
            return Ok(());
        }

        let seeked = self
            .format
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: position as u64,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| AudioError::SeekError(e.to_string()))?;
        self.decoder.reset();
        self.finished = false;

        // The container lands on a packet boundary at or before the target
        let mut skip = position.saturating_sub(seeked.actual_ts as usize);
        while skip > 0 {
            if !self.decode_next() {
                self.finished = true;
                break;
            }
            if skip < self.pending.len() {
                self.pending_offset = skip;
                skip = 0;
            } else {
                skip -= self.pending.len();
                self.clear_pending();
            }
        }

        self.position = position;
        Ok(())
    }
}

/// Count frames by walking every packet, then rewind
fn scan_len(format: &mut dyn FormatReader, track_id: u32) -> Result<usize> {
    let mut total: u64 = 0;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    total += packet.dur;
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }

    format.seek(
        SeekMode::Coarse,
        SeekTo::TimeStamp { ts: 0, track_id },
    )?;

    Ok(total as usize)
}

/// Convert a decoded packet to stereo frames
fn append_frames(
    decoded: AudioBufferRef<'_>,
    sample_buf: &mut Option<SampleBuffer<f32>>,
    pending: &mut Vec<Frame>,
) {
    let spec = *decoded.spec();
    let channels = spec.channels.count();
    let frames = decoded.frames();
    if channels == 0 || frames == 0 {
        return;
    }

    let needed = decoded.capacity() * channels;
    if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
        *sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
    }
    let Some(buf) = sample_buf.as_mut() else {
        return;
    };
    buf.copy_interleaved_ref(decoded);

    let samples = buf.samples();
    pending.reserve(frames);
    if channels == 1 {
        pending.extend(samples.iter().map(|&s| [s, s]));
    } else {
        pending.extend(samples.chunks_exact(channels).map(|c| [c[0], c[1]]));
    }
}
