use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use openssl::bn::{BigNum, BigNumRef};
use std::io::{self, Read};
use std::str;
use zeroize::Zeroizing;

// OpenSSH refuses integers longer than the largest RSA modulus it generates
const MAX_BIGNUM: usize = 16384 / 8;

/// [io::Read](https://doc.rust-lang.org/std/io/trait.Read.html) extension to read ssh data
pub trait SshReadExt {
    /// Read 32 bits unsigned integer in big endian
    fn read_uint32(&mut self) -> io::Result<u32>;

    /// Read bytes array or string
    ///
    /// Before the binary string, there is a 32 bits unsigned integer to indicate the length of the data,
    /// and the binary string is **NOT** null-terminating.
    fn read_string(&mut self) -> io::Result<Vec<u8>>;

    /// Read UTF-8 string
    fn read_utf8(&mut self) -> io::Result<String>;

    /// Read multiple precision integer
    ///
    /// Negative numbers and integers longer than 16384 bits are rejected.
    fn read_mpint(&mut self) -> io::Result<BigNum>;
}

impl<R: io::Read + ?Sized> SshReadExt for R {
    fn read_uint32(&mut self) -> io::Result<u32> {
        self.read_u32::<BigEndian>()
    }
    fn read_string(&mut self) -> io::Result<Vec<u8>> {
        let length = self.read_uint32()? as usize;
        let mut buf = Vec::new();
        // Don't trust the length field before the data actually arrives
        (&mut *self).take(length as u64).read_to_end(&mut buf)?;
        if buf.len() != length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Truncated string",
            ));
        }
        Ok(buf)
    }
    fn read_utf8(&mut self) -> io::Result<String> {
        let data = self.read_string()?;
        String::from_utf8(data)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Invalid UTF-8 sequence"))
    }
    fn read_mpint(&mut self) -> io::Result<BigNum> {
        let data = self.read_string()?;
        to_bignum(&data)
    }
}

/// [io::Read](https://doc.rust-lang.org/std/io/trait.Read.html) extension to securely read ssh data
///
/// Behaves as [SshReadExt](trait.SshReadExt.html) does, but intermediate buffers are zeroed on drop.
pub trait ZeroizeReadExt {
    fn read_uint32_zeroize(&mut self) -> io::Result<Zeroizing<u32>>;
    fn read_string_zeroize(&mut self) -> io::Result<Zeroizing<Vec<u8>>>;
    fn read_utf8_zeroize(&mut self) -> io::Result<Zeroizing<String>>;
    fn read_mpint_zeroize(&mut self) -> io::Result<BigNum>;
}

impl<R: io::Read + ?Sized> ZeroizeReadExt for R {
    fn read_uint32_zeroize(&mut self) -> io::Result<Zeroizing<u32>> {
        let mut buf = Zeroizing::new([0u8; 4]);
        self.read_exact(&mut *buf)?;
        Ok(Zeroizing::new(BigEndian::read_u32(&*buf)))
    }
    fn read_string_zeroize(&mut self) -> io::Result<Zeroizing<Vec<u8>>> {
        let length = self.read_uint32_zeroize()?;
        let mut buf = Zeroizing::new(Vec::new());
        (&mut *self).take(*length as u64).read_to_end(&mut buf)?;
        if buf.len() != *length as usize {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Truncated string",
            ));
        }
        Ok(buf)
    }
    fn read_utf8_zeroize(&mut self) -> io::Result<Zeroizing<String>> {
        let data = self.read_string_zeroize()?;
        // `data` is zeroed even when the conversion fails
        match str::from_utf8(&data) {
            Ok(s) => Ok(Zeroizing::new(String::from(s))),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid UTF-8 sequence",
            )),
        }
    }
    fn read_mpint_zeroize(&mut self) -> io::Result<BigNum> {
        let data = self.read_string_zeroize()?;
        to_bignum(&data)
    }
}

fn to_bignum(data: &[u8]) -> io::Result<BigNum> {
    if !data.is_empty() && data[0] & 0x80 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Negative Big Number",
        ));
    }
    if (data.len() > MAX_BIGNUM + 1) || (data.len() == MAX_BIGNUM + 1 && data[0] != 0) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Big Number Too Long",
        ));
    }
    let start = data.iter().take_while(|b| **b == 0).count();
    BigNum::from_slice(&data[start..])
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Invalid Big Number"))
}

/// [io::Write](https://doc.rust-lang.org/std/io/trait.Write.html) extension to write ssh data
pub trait SshWriteExt {
    /// Write 32 bits unsigned integer in big endian
    fn write_uint32(&mut self, value: u32) -> io::Result<()>;

    /// Write binary string data, prefixed by its 32 bits length
    fn write_string(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Write UTF-8 string
    fn write_utf8(&mut self, value: &str) -> io::Result<()>;

    /// Write multiple precision integer
    ///
    /// Zero is written as an empty string, and a leading zero byte is added when the
    /// highest bit is set so that the number stays positive.
    fn write_mpint(&mut self, value: &BigNumRef) -> io::Result<()>;
}

impl<W: io::Write + ?Sized> SshWriteExt for W {
    fn write_uint32(&mut self, value: u32) -> io::Result<()> {
        self.write_u32::<BigEndian>(value)
    }
    fn write_string(&mut self, buf: &[u8]) -> io::Result<()> {
        if buf.len() > u32::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "String too long",
            ));
        }
        self.write_uint32(buf.len() as u32)?;
        self.write_all(buf)
    }
    fn write_utf8(&mut self, value: &str) -> io::Result<()> {
        self.write_string(value.as_bytes())
    }
    fn write_mpint(&mut self, value: &BigNumRef) -> io::Result<()> {
        let bytes = Zeroizing::new(value.to_vec());
        match bytes.first() {
            Some(b) if b & 0x80 != 0 => {
                let mut buf = Zeroizing::new(Vec::with_capacity(bytes.len() + 1));
                buf.push(0);
                buf.extend_from_slice(&bytes);
                self.write_string(&buf)
            }
            _ => self.write_string(&bytes),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn mpint_encoding() {
        let cases: [(u32, &[u8]); 3] = [
            (0, &[0, 0, 0, 0]),
            (0x7f, &[0, 0, 0, 1, 0x7f]),
            (0x80, &[0, 0, 0, 2, 0x00, 0x80]),
        ];
        for (value, expected) in cases.iter() {
            let mut buf = Vec::new();
            buf.write_mpint(&BigNum::from_u32(*value).unwrap()).unwrap();
            assert_eq!(&buf[..], *expected);
            let decoded = Cursor::new(&buf).read_mpint().unwrap();
            assert_eq!(decoded, BigNum::from_u32(*value).unwrap());
        }
    }

    #[test]
    fn negative_mpint_rejected() {
        let data = [0u8, 0, 0, 1, 0x80];
        assert!(Cursor::new(&data[..]).read_mpint().is_err());
    }

    #[test]
    fn truncated_string_rejected() {
        let data = [0u8, 0, 0, 8, b'a', b'b'];
        assert!(Cursor::new(&data[..]).read_string().is_err());
        assert!(Cursor::new(&data[..]).read_string_zeroize().is_err());
    }
}
