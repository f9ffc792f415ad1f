use nom::number::complete::{le_u16, u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::{checksum, REQUEST_LEN};

type Buf = [u8];

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub(crate) enum RequestToken {
    /// A well formed request. The command is still the raw high nibble
    /// and the address the raw low nibble.
    Request { command: u8, address: u8 },
    InvalidLength(u8),
    ChecksumMismatch { expected: u16, received: u16 },
}

/// Validate one complete request frame.
pub(crate) fn parse_request(frame: &[u8; REQUEST_LEN]) -> RequestToken {
    match request(frame) {
        Ok((_, token)) => token,
        // four bytes always hold the length, command and checksum fields
        Err(_) => RequestToken::InvalidLength(frame[0]),
    }
}

fn request(buf: &Buf) -> IResult<&Buf, RequestToken> {
    let (buf, (length, command_address, received)) = tuple((u8, u8, le_u16))(buf)?;

    if usize::from(length) != REQUEST_LEN {
        return Ok((buf, RequestToken::InvalidLength(length)));
    }
    // only the length and command bytes are covered by the request checksum
    let expected = checksum(&[length, command_address]);
    if expected != received {
        return Ok((buf, RequestToken::ChecksumMismatch { expected, received }));
    }
    Ok((
        buf,
        RequestToken::Request {
            command: command_address & 0xF0,
            address: command_address & 0x0F,
        },
    ))
}
