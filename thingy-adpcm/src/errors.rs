// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `SinkErrorKind` is a list of reasons why the audio sink may fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SinkErrorKind {
    /// The output stream could not be opened.
    OpenStream,
    /// The output stream was opened, but could not be started.
    PlayStream,
    /// The output stream was closed while writing.
    StreamClosed,
}

impl SinkErrorKind {
    fn as_str(&self) -> &'static str {
        match *self {
            SinkErrorKind::OpenStream => "failed to open the output stream",
            SinkErrorKind::PlayStream => "failed to start the output stream",
            SinkErrorKind::StreamClosed => "output stream closed",
        }
    }
}

/// `Error` provides an enumeration of all possible errors reported while loading, decoding, or
/// playing a Thingy ADPCM stream.
#[derive(Debug)]
pub enum Error {
    /// An IO error occured while reading the resource.
    IoError(io::Error),
    /// The frame header was truncated or carried an out-of-range step index.
    MalformedFrame(&'static str),
    /// The platform audio sink failed.
    AudioSinkError(SinkErrorKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => err.fmt(f),
            Error::MalformedFrame(msg) => {
                write!(f, "malformed frame: {}", msg)
            }
            Error::AudioSinkError(ref kind) => {
                write!(f, "audio sink error: {}", kind.as_str())
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            Error::MalformedFrame(_) => None,
            Error::AudioSinkError(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a malformed frame error.
pub fn malformed_frame_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::MalformedFrame(desc))
}

/// Convenience function to create an audio sink error.
pub fn sink_error<T>(kind: SinkErrorKind) -> Result<T> {
    Err(Error::AudioSinkError(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as _;

    #[test]
    fn verify_error_display() {
        let err = malformed_frame_error::<()>("step index out of range").unwrap_err();
        assert_eq!(err.to_string(), "malformed frame: step index out of range");

        let err = sink_error::<()>(SinkErrorKind::PlayStream).unwrap_err();
        assert_eq!(err.to_string(), "audio sink error: failed to start the output stream");
    }

    #[test]
    fn verify_io_error_source() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "sampl2.hexformat"));

        assert!(matches!(err, Error::IoError(_)));
        assert!(err.source().is_some());
        assert!(Error::MalformedFrame("truncated header").source().is_none());
    }
}
