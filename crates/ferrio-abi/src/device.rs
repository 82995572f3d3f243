//! File-descriptor-backed devices for the default units.
//!
//! The open-file layer proper is an external collaborator; what the
//! runtime itself must provide is the processor default unit, which
//! maps to the process standard streams. Records on a byte stream are
//! newline-terminated lines.

use ferrio_core::IoError;
use ferrio_core::unit::{Connection, Device};

/// Sequential newline-delimited records over a raw fd.
pub struct FdDevice {
    fd: i32,
    read_buf: Vec<u8>,
    read_pos: usize,
    eof: bool,
}

impl FdDevice {
    pub fn new(fd: i32) -> Self {
        Self {
            fd,
            read_buf: Vec::new(),
            read_pos: 0,
            eof: false,
        }
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), IoError> {
        while !bytes.is_empty() {
            let rc = unsafe { libc::write(self.fd, bytes.as_ptr().cast(), bytes.len()) };
            if rc < 0 {
                return Err(IoError::DeviceFailure(errno()));
            }
            bytes = &bytes[rc as usize..];
        }
        Ok(())
    }

    fn refill(&mut self) -> Result<usize, IoError> {
        let mut tmp = [0u8; 8192];
        let rc = unsafe { libc::read(self.fd, tmp.as_mut_ptr().cast(), tmp.len()) };
        if rc < 0 {
            return Err(IoError::DeviceFailure(errno()));
        }
        if rc == 0 {
            self.eof = true;
        } else {
            self.read_buf.drain(..self.read_pos);
            self.read_pos = 0;
            self.read_buf.extend_from_slice(&tmp[..rc as usize]);
        }
        Ok(rc as usize)
    }
}

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

impl Device for FdDevice {
    fn write(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        self.write_all(bytes)
    }

    fn end_record(&mut self) -> Result<(), IoError> {
        self.write_all(b"\n")
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, IoError> {
        loop {
            if let Some(nl) = self.read_buf[self.read_pos..]
                .iter()
                .position(|b| *b == b'\n')
            {
                let record = self.read_buf[self.read_pos..self.read_pos + nl].to_vec();
                self.read_pos += nl + 1;
                return Ok(Some(record));
            }
            if self.eof {
                if self.read_pos < self.read_buf.len() {
                    // Final record without a terminator.
                    let record = self.read_buf[self.read_pos..].to_vec();
                    self.read_pos = self.read_buf.len();
                    return Ok(Some(record));
                }
                return Ok(None);
            }
            self.refill()?;
        }
    }

    fn seek_record(&mut self, record: i64) -> Result<(), IoError> {
        // Streams are not record addressable.
        Err(IoError::BadRecordNumber(record))
    }
}

/// Connection for the default output unit (stdout).
pub fn default_output() -> Connection {
    Connection::new(Box::new(FdDevice::new(libc::STDOUT_FILENO)), false, true, false)
}

/// Connection for the default input unit (stdin).
pub fn default_input() -> Connection {
    Connection::new(Box::new(FdDevice::new(libc::STDIN_FILENO)), true, false, false)
}
