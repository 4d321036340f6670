use std::io::{self, Read};

use super::{BoundedLine, LineAssembler};

pub struct SyncBoundedLineReader<R: Read> {
    reader: R,
    assembler: LineAssembler,
    done: bool,
}

impl<R: Read> SyncBoundedLineReader<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader,
            assembler: LineAssembler::new(max_line_bytes),
            done: false,
        }
    }

    /// Number of the line a read error would be attributed to.
    pub fn pending_line_number(&self) -> usize {
        self.assembler.pending_line_number()
    }

    /// Reads the next line. `Ok(None)` means the source is exhausted.
    pub fn next_line(&mut self) -> io::Result<Option<BoundedLine>> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(line) = self.assembler.next_line() {
                return Ok(Some(line));
            }

            let n = match self.reader.read(self.assembler.spare()) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Err(err);
                }
            };
            if n == 0 {
                self.done = true;
                return Ok(self.assembler.finish());
            }
            self.assembler.filled(n);
        }
    }
}

impl<R: Read> Iterator for SyncBoundedLineReader<R> {
    type Item = io::Result<BoundedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(bytes: Vec<u8>, max_line_bytes: usize) -> Vec<BoundedLine> {
        SyncBoundedLineReader::new(io::Cursor::new(bytes), max_line_bytes)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn oversized_line_is_reported_and_iteration_continues() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"ok\n");
        bytes.extend_from_slice(&vec![b'a'; 50]);
        bytes.extend_from_slice(b"\nnext\n");

        let lines = collect(bytes, 16);

        assert!(matches!(lines[0], BoundedLine::Line { line_number: 1, .. }));
        assert!(matches!(
            lines[1],
            BoundedLine::LineTooLong {
                line_number: 2,
                observed_bytes: 50,
                max_line_bytes: 16
            }
        ));
        assert!(matches!(lines[2], BoundedLine::Line { line_number: 3, .. }));
    }

    #[test]
    fn final_line_without_newline_is_delivered() {
        let lines = collect(b"a\nb".to_vec(), 16);
        assert_eq!(
            lines,
            vec![
                BoundedLine::Line {
                    line_number: 1,
                    bytes: b"a".to_vec()
                },
                BoundedLine::Line {
                    line_number: 2,
                    bytes: b"b".to_vec()
                },
            ]
        );
    }

    #[test]
    fn lines_spanning_chunks_are_joined() {
        let mut bytes = vec![b'x'; super::super::CHUNK_SIZE_BYTES + 10];
        bytes.push(b'\n');
        let lines = collect(bytes, 64 * 1024);
        assert_eq!(lines.len(), 1);
        match &lines[0] {
            BoundedLine::Line { bytes, .. } => {
                assert_eq!(bytes.len(), super::super::CHUNK_SIZE_BYTES + 10)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "boom"))
        }
    }

    #[test]
    fn read_errors_surface_once() {
        let mut reader = SyncBoundedLineReader::new(FailingReader, 16);
        assert_eq!(reader.pending_line_number(), 1);
        assert!(reader.next_line().is_err());
        assert!(reader.next_line().unwrap().is_none());
    }
}
