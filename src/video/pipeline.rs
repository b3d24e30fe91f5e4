use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::PlayerError;

/// How long `terminate` waits for a killed decoder to be reaped before
/// abandoning it.
const TERMINATE_TIMEOUT: Duration = Duration::from_millis(500);

/// Result of a blocking read against the decoder's output pipe.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The buffer was filled completely.
    Full,
    /// The stream ended after `n` bytes; the buffer's tail is untouched.
    Short(usize),
    /// The stream ended before any byte arrived.
    Eof,
}

/// One live decoder subprocess plus its stdout.
///
/// The reading loop owns the pipeline (and with it the pipe); any other
/// thread can hold a [`PipelineHandle`] and kill the process out-of-band,
/// which closes the pipe and promptly unblocks an in-flight `read_exact`
/// with EOF. That kill-to-cancel pattern is the only way to interrupt a
/// blocked read, since ffmpeg has no cooperative stop protocol.
pub struct DecoderPipeline {
    child: Arc<Mutex<Child>>,
    stdout: ChildStdout,
}

impl DecoderPipeline {
    /// Spawn the decoder with stdout piped and stderr discarded (decoder
    /// diagnostics are not surfaced unless the spawn itself fails).
    pub fn spawn(mut cmd: Command) -> Result<Self, PlayerError> {
        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(PlayerError::Spawn)?;

        // Piped stdout is always present after a successful spawn.
        let stdout = child.stdout.take().ok_or_else(|| {
            PlayerError::Spawn(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "decoder spawned without a stdout pipe",
            ))
        })?;

        log::info!("Spawned decoder process (PID {})", child.id());
        Ok(Self {
            child: Arc::new(Mutex::new(child)),
            stdout,
        })
    }

    /// Handle for out-of-band termination and liveness checks.
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            child: Arc::clone(&self.child),
        }
    }

    /// Block until `buf` is full, the decoder closes its pipe, or the pipe
    /// breaks. A short final read is reported as `Short`, never an error.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<ReadOutcome> {
        read_full(&mut self.stdout, buf)
    }

    pub fn is_alive(&self) -> bool {
        self.handle().is_alive()
    }

    pub fn terminate(&self) {
        self.handle().terminate();
    }
}

/// Cloneable kill-switch for a [`DecoderPipeline`].
#[derive(Clone)]
pub struct PipelineHandle {
    child: Arc<Mutex<Child>>,
}

impl PipelineHandle {
    pub fn is_alive(&self) -> bool {
        let mut child = self.child.lock().unwrap();
        matches!(child.try_wait(), Ok(None))
    }

    /// Force-kill the decoder and wait (bounded) for the zombie to be
    /// reaped. Terminating an already-dead process is a no-op.
    pub fn terminate(&self) {
        let mut child = self.child.lock().unwrap();

        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => {
                log::warn!("Error checking decoder process state: {}", e);
                return;
            }
        }

        log::debug!("Killing decoder process (PID {})", child.id());
        let _ = child.kill();

        let start_time = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    log::debug!("Decoder process terminated ({})", status);
                    break;
                }
                Ok(None) => {
                    if start_time.elapsed() > TERMINATE_TIMEOUT {
                        log::warn!("Decoder process taking too long to terminate, abandoning");
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    log::warn!("Error waiting for decoder process: {}", e);
                    break;
                }
            }
        }
    }
}

/// Fill `buf` from `reader`, tolerating partial reads. Returns `Eof` if the
/// stream was already closed, `Short(n)` if it closed mid-buffer.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<ReadOutcome> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => {
                return Ok(if total == 0 {
                    ReadOutcome::Eof
                } else {
                    ReadOutcome::Short(total)
                });
            }
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(ReadOutcome::Full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_full_fills_buffer() {
        let mut reader = Cursor::new(vec![7u8; 64]);
        let mut buf = [0u8; 16];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), ReadOutcome::Full);
        assert!(buf.iter().all(|&b| b == 7));
    }

    #[test]
    fn test_read_full_reports_eof() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        let mut buf = [0u8; 16];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn test_read_full_reports_short_final_read() {
        let mut reader = Cursor::new(vec![1u8; 10]);
        let mut buf = [0u8; 16];
        assert_eq!(
            read_full(&mut reader, &mut buf).unwrap(),
            ReadOutcome::Short(10)
        );
        assert_eq!(&buf[..10], &[1u8; 10]);
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let pipeline = DecoderPipeline::spawn(Command::new("true")).expect("spawn true");
        let handle = pipeline.handle();
        // Let the process exit naturally, then terminate twice.
        std::thread::sleep(Duration::from_millis(50));
        handle.terminate();
        handle.terminate();
        assert!(!handle.is_alive());
    }

    #[test]
    fn test_kill_unblocks_reader_with_eof() {
        // `cat` with no arguments blocks on its (closed-on-kill) stdin and
        // produces nothing, so the read stays blocked until terminate.
        let mut cmd = Command::new("cat");
        cmd.stdin(Stdio::piped());
        let mut pipeline = DecoderPipeline::spawn(cmd).expect("spawn cat");
        let handle = pipeline.handle();

        let killer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            handle.terminate();
        });

        let started = Instant::now();
        let mut buf = [0u8; 1024];
        let outcome = pipeline.read_exact(&mut buf).expect("read after kill");
        assert_eq!(outcome, ReadOutcome::Eof);
        assert!(started.elapsed() < Duration::from_secs(2));
        killer.join().unwrap();
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let cmd = Command::new("/nonexistent/decoder-binary");
        match DecoderPipeline::spawn(cmd) {
            Err(PlayerError::Spawn(_)) => {}
            other => panic!("expected spawn error, got {:?}", other.map(|_| ())),
        }
    }
}
