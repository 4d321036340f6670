use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{BoundedLine, LineAssembler};

pub struct AsyncBoundedLineReader<R: AsyncRead + Unpin> {
    reader: R,
    assembler: LineAssembler,
    done: bool,
}

impl<R: AsyncRead + Unpin> AsyncBoundedLineReader<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader,
            assembler: LineAssembler::new(max_line_bytes),
            done: false,
        }
    }

    pub fn pending_line_number(&self) -> usize {
        self.assembler.pending_line_number()
    }

    /// Reads the next line. `Ok(None)` means the source is exhausted.
    pub async fn next_line(&mut self) -> io::Result<Option<BoundedLine>> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(line) = self.assembler.next_line() {
                return Ok(Some(line));
            }

            let n = match self.reader.read(self.assembler.spare()).await {
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
