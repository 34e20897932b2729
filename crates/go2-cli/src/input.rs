use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Read stdin lines on a background thread. The receiver disconnects on EOF
/// or on a read error.
pub fn spawn_stdin_reader() -> anyhow::Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            let mut reader = stdin.lock();
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(decode_line(&buf)).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Invalid UTF-8 is replaced rather than rejected, so a garbled line is
/// answered like any other bad command.
fn decode_line(raw: &[u8]) -> String {
    let line = String::from_utf8_lossy(raw);
    line.trim_end_matches(['\n', '\r']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_endings() {
        assert_eq!(decode_line(b"3 /go\r\n"), "3 /go");
        assert_eq!(decode_line(b"q"), "q");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let line = decode_line(b"\xff\xfe garbage\n");
        assert!(line.ends_with(" garbage"));
        assert!(line.contains('\u{FFFD}'));
    }
}
