// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// `Nibble` represents the lower or upper 4 bits of a byte
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Nibble {
    Upper,
    Lower,
}

impl Nibble {
    /// Payload bytes are unpacked high nibble first.
    pub(crate) const ORDER: [Nibble; 2] = [Nibble::Upper, Nibble::Lower];

    pub(crate) fn get_nibble(&self, byte: u8) -> u8 {
        match self {
            Nibble::Upper => byte >> 4,
            Nibble::Lower => byte & 0x0F,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Nibble;

    #[test]
    fn verify_nibble_order() {
        let unpacked: Vec<u8> = Nibble::ORDER.iter().map(|n| n.get_nibble(0xa5)).collect();
        assert_eq!(unpacked, [0xa, 0x5]);
    }
}
