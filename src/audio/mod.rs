//! Audio I/O for the CLI frontend.
//!
//! Reads interleaved little-endian `f32` frames, processes them one block at
//! a time and writes the same format back out.

use std::io::{self, Read, Write};

use crate::error::{CircuitError, Result};
use crate::netlist::Netlist;

/// Default block size (in frames).
pub const BUFFER_SIZE: usize = 256;

const SAMPLE_BYTES: usize = 4;

/// Raw `f32le` sample reader.
pub struct AudioInput<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl AudioInput<io::Stdin> {
    /// Read from standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<R: Read> AudioInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }

    /// Fill `samples` from the stream.
    ///
    /// Returns the number of whole samples read; fewer than requested only
    /// at end of stream, and 0 once the stream is exhausted. A trailing
    /// partial sample is dropped.
    pub fn read_block(&mut self, samples: &mut [f32]) -> Result<usize> {
        let bytes_to_read = samples.len() * SAMPLE_BYTES;
        self.buffer.resize(bytes_to_read, 0);

        let mut filled = 0;
        while filled < bytes_to_read {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(CircuitError::AudioInputError {
                        message: e.to_string(),
                    })
                }
            }
        }

        let samples_read = filled / SAMPLE_BYTES;
        for (sample, bytes) in samples
            .iter_mut()
            .zip(self.buffer[..samples_read * SAMPLE_BYTES].chunks_exact(SAMPLE_BYTES))
        {
            *sample = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        Ok(samples_read)
    }
}

/// Raw `f32le` sample writer.
pub struct AudioOutput<W> {
    writer: W,
    buffer: Vec<u8>,
}

impl AudioOutput<io::Stdout> {
    /// Write to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AudioOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: Vec::new(),
        }
    }

    /// Write a block of samples.
    pub fn write_block(&mut self, samples: &[f32]) -> Result<()> {
        self.buffer.clear();
        for &sample in samples {
            self.buffer.extend_from_slice(&sample.to_le_bytes());
        }

        self.writer
            .write_all(&self.buffer)
            .map_err(|e| CircuitError::AudioOutputError {
                message: e.to_string(),
            })
    }

    /// Flush the output stream.
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| CircuitError::AudioOutputError {
                message: e.to_string(),
            })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Split interleaved frames into per-channel buffers.
fn deinterleave(interleaved: &[f32], channels: &mut [Vec<f32>]) {
    let count = channels.len();
    for (ch, buffer) in channels.iter_mut().enumerate() {
        buffer.clear();
        buffer.extend(interleaved.iter().skip(ch).step_by(count));
    }
}

/// Write per-channel buffers back as interleaved frames.
fn interleave(channels: &[Vec<f32>], interleaved: &mut [f32]) {
    let count = channels.len();
    for (ch, buffer) in channels.iter().enumerate() {
        for (frame, &sample) in buffer.iter().enumerate() {
            interleaved[frame * count + ch] = sample;
        }
    }
}

/// Run a whole stream through the netlist.
///
/// `channels` is the number of interleaved channels in the stream and
/// `block_size` the number of frames per block.
pub fn process_stream<R: Read, W: Write>(
    netlist: &mut Netlist,
    input: &mut AudioInput<R>,
    output: &mut AudioOutput<W>,
    channels: usize,
    block_size: usize,
) -> Result<u64> {
    if channels == 0 || block_size == 0 {
        return Err(CircuitError::invalid_param(
            "channel count and block size must be at least 1",
        ));
    }

    let mut interleaved = vec![0.0f32; block_size * channels];
    let mut planar: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(block_size)).collect();
    let mut frames_total = 0u64;

    loop {
        let samples_read = input.read_block(&mut interleaved)?;
        // Drop an incomplete trailing frame
        let frames = samples_read / channels;
        if frames == 0 {
            break;
        }
        let block = &mut interleaved[..frames * channels];

        deinterleave(block, &mut planar);
        {
            let mut buffers: Vec<&mut [f32]> = planar.iter_mut().map(|b| b.as_mut_slice()).collect();
            netlist.process_block(&mut buffers);
        }
        interleave(&planar, block);

        output.write_block(block)?;
        frames_total += frames as u64;

        if samples_read < interleaved.len() {
            break;
        }
    }

    output.flush()?;
    Ok(frames_total)
}

/// Process audio from stdin to stdout using the given netlist.
pub fn process_audio(netlist: &mut Netlist, channels: usize, block_size: usize) -> Result<u64> {
    let mut input = AudioInput::stdin();
    let mut output = AudioOutput::stdout();
    process_stream(netlist, &mut input, &mut output, channels, block_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessSettings;
    use std::io::Cursor;

    fn encode(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn decode(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    /// Reader that hands out at most three bytes per call.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3);
            self.0.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_read_block_reassembles_short_reads() {
        let samples = [0.5f32, -1.0, 0.25];
        let mut input = AudioInput::new(Trickle(Cursor::new(encode(&samples))));
        let mut block = [0.0f32; 4];

        assert_eq!(input.read_block(&mut block).unwrap(), 3);
        assert_eq!(&block[..3], &samples);
        assert_eq!(input.read_block(&mut block).unwrap(), 0);
    }

    #[test]
    fn test_interleaving() {
        let frames = [1.0f32, 10.0, 2.0, 20.0, 3.0, 30.0];
        let mut planar = vec![Vec::new(), Vec::new()];
        deinterleave(&frames, &mut planar);
        assert_eq!(planar, vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]);

        let mut back = [0.0f32; 6];
        interleave(&planar, &mut back);
        assert_eq!(back, frames);
    }

    #[test]
    fn test_stereo_stream_through_divider() {
        let mut netlist = Netlist::new();
        netlist.prepare(&ProcessSettings::new().with_channels(2)).unwrap();
        netlist.init("Vi 1 0 0\nR 1 2 1k\nR 2 0 1k\nVo 2 0 0").unwrap();

        // 5 frames with a block size of 2 leaves a short final block
        let frames: Vec<f32> = (0..10).map(|k| if k % 2 == 0 { 1.0 } else { -0.5 }).collect();
        let mut input = AudioInput::new(Cursor::new(encode(&frames)));
        let mut output = AudioOutput::new(Vec::new());

        let count = process_stream(&mut netlist, &mut input, &mut output, 2, 2).unwrap();
        assert_eq!(count, 5);

        let out = decode(&output.into_inner());
        assert_eq!(out.len(), 10);
        for pair in out.chunks_exact(2) {
            assert!((pair[0] - 0.5).abs() < 1e-6);
            assert!((pair[1] + 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_uninitialized_stream_passes_through() {
        let mut netlist = Netlist::new();
        let samples = [0.1f32, 0.2, 0.3];
        let mut input = AudioInput::new(Cursor::new(encode(&samples)));
        let mut output = AudioOutput::new(Vec::new());

        process_stream(&mut netlist, &mut input, &mut output, 1, BUFFER_SIZE).unwrap();
        assert_eq!(decode(&output.into_inner()), samples);
    }
}
