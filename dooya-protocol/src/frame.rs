//! Frame encoding, CRC validation and stream reassembly.
//!
//! Frame format:
//! - START (1 byte): 0x55 synchronization byte
//! - ADDRESS (2 bytes): motor address as configured on the motor
//! - CLASS (1 byte): `READ` or `CONTROL`
//! - PAYLOAD (1+ bytes): class-specific data
//! - CRC (2 bytes): CRC-16/MODBUS of all preceding bytes, low byte first

use heapless::Vec;

use crate::commands::CommandClass;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0x55;

/// START + ADDRESS + CLASS
pub const HEADER_SIZE: usize = 4;

/// Trailing CRC-16 size
pub const CRC_SIZE: usize = 2;

/// Shortest frame the assembler will try to validate
/// (header, one payload byte, CRC)
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 1 + CRC_SIZE;

/// Upper bound on a frame held in the receive buffer.
///
/// The longest reply a motor sends is nine bytes; anything past this cap is
/// a stream that will never produce a matching CRC.
pub const MAX_FRAME_SIZE: usize = 32;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - HEADER_SIZE - CRC_SIZE;

/// Errors that can occur while building a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Byte sequence is shorter than a complete frame
    TooShort,
    /// Byte sequence does not start with [`FRAME_START`]
    InvalidStart,
    /// Class byte is neither `READ` nor `CONTROL`
    InvalidClass,
    /// Trailing CRC does not match the frame contents
    InvalidChecksum,
}

/// Two-byte motor address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceAddress([u8; 2]);

impl DeviceAddress {
    /// Broadcast address accepted by every motor on the bus
    pub const BROADCAST: Self = Self([0x00, 0x00]);

    pub const fn new(high: u8, low: u8) -> Self {
        Self([high, low])
    }

    /// Address in wire order
    pub const fn bytes(&self) -> [u8; 2] {
        self.0
    }

    /// Address as the single 16-bit number printed on the motor label
    pub const fn as_u16(&self) -> u16 {
        u16::from_be_bytes(self.0)
    }
}

impl From<u16> for DeviceAddress {
    fn from(value: u16) -> Self {
        Self(value.to_be_bytes())
    }
}

/// CRC-16 over `data`
///
/// Reflected polynomial 0xA001, initial value 0xFFFF, no final XOR
/// (the MODBUS variant).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Check that the last two bytes of `bytes` are the little-endian CRC of
/// the bytes before them.
pub fn validate(bytes: &[u8]) -> bool {
    if bytes.len() <= CRC_SIZE {
        return false;
    }
    let (body, crc) = bytes.split_at(bytes.len() - CRC_SIZE);
    crc16(body).to_le_bytes() == [crc[0], crc[1]]
}

/// A complete, CRC-valid frame as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    class: CommandClass,
    bytes: Vec<u8, MAX_FRAME_SIZE>,
}

impl Frame {
    /// Build a frame for `address`, appending the CRC
    pub fn encode(
        address: DeviceAddress,
        class: CommandClass,
        payload: &[u8],
    ) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let [addr0, addr1] = address.bytes();
        let mut bytes = Vec::new();
        bytes
            .extend_from_slice(&[FRAME_START, addr0, addr1, class.to_byte()])
            .map_err(|_| FrameError::PayloadTooLarge)?;
        bytes
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        let crc = crc16(&bytes);
        bytes
            .extend_from_slice(&crc.to_le_bytes())
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self { class, bytes })
    }

    /// Parse a complete frame from a byte slice
    ///
    /// Unlike [`FrameAssembler`], this does not filter on address.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_SIZE {
            return Err(FrameError::TooShort);
        }
        if bytes.len() > MAX_FRAME_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }
        if bytes[0] != FRAME_START {
            return Err(FrameError::InvalidStart);
        }
        let class = CommandClass::from_byte(bytes[3]).ok_or(FrameError::InvalidClass)?;
        if !validate(bytes) {
            return Err(FrameError::InvalidChecksum);
        }

        let mut vec = Vec::new();
        vec.extend_from_slice(bytes)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { class, bytes: vec })
    }

    /// Address the frame was sent to or from
    pub fn address(&self) -> DeviceAddress {
        DeviceAddress::new(self.bytes[1], self.bytes[2])
    }

    /// Command class of the frame
    pub fn class(&self) -> CommandClass {
        self.class
    }

    /// Bytes between the class byte and the CRC
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.bytes.len() - CRC_SIZE]
    }

    /// Byte at an absolute frame offset, if it lies before the CRC
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        if offset < self.bytes.len() - CRC_SIZE {
            Some(self.bytes[offset])
        } else {
            None
        }
    }

    /// Trailing CRC value
    pub fn checksum(&self) -> u16 {
        let len = self.bytes.len();
        u16::from_le_bytes([self.bytes[len - 2], self.bytes[len - 1]])
    }

    /// The full frame, ready to transmit
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Receive-side position in the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum AssembleState {
    /// Waiting for START byte
    WaitingForStart,
    /// Got START, waiting for first address byte
    WaitingForAddress0,
    /// Waiting for second address byte
    WaitingForAddress1,
    /// Waiting for CLASS
    WaitingForClass,
    /// Header matched; collecting payload until the CRC lines up
    Accumulating(CommandClass),
}

/// Byte-at-a-time frame reassembly for one motor address
///
/// The header is matched strictly: a wrong byte in any of the first four
/// positions drops everything collected so far (including that byte) and
/// the assembler waits for a fresh START. Once the header matches, bytes are
/// accepted unconditionally and the CRC is re-checked after each one from
/// [`MIN_FRAME_SIZE`] onward. A CRC mismatch only means "not finished yet".
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    address: DeviceAddress,
    state: AssembleState,
    buffer: Vec<u8, MAX_FRAME_SIZE>,
}

impl FrameAssembler {
    /// Create an assembler that accepts frames for `address`
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            state: AssembleState::WaitingForStart,
            buffer: Vec::new(),
        }
    }

    /// Discard any partial frame
    pub fn reset(&mut self) {
        self.state = AssembleState::WaitingForStart;
        self.buffer.clear();
    }

    /// Number of bytes collected towards the current frame
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Feed a single byte
    ///
    /// Returns `Some(frame)` when the byte completes a CRC-valid frame.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        let [addr0, addr1] = self.address.bytes();

        match self.state {
            AssembleState::WaitingForStart => {
                // Line noise between frames is expected; drop it quietly
                if byte == FRAME_START {
                    self.accept(byte, AssembleState::WaitingForAddress0);
                }
                None
            }
            AssembleState::WaitingForAddress0 => {
                self.expect(byte == addr0, byte, AssembleState::WaitingForAddress1);
                None
            }
            AssembleState::WaitingForAddress1 => {
                self.expect(byte == addr1, byte, AssembleState::WaitingForClass);
                None
            }
            AssembleState::WaitingForClass => {
                match CommandClass::from_byte(byte) {
                    Some(class) => self.accept(byte, AssembleState::Accumulating(class)),
                    None => self.resync(byte),
                }
                None
            }
            AssembleState::Accumulating(class) => {
                if self.buffer.push(byte).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "Dropping {} bytes without a CRC match",
                        self.buffer.len() + 1
                    );
                    self.reset();
                    return None;
                }

                if self.buffer.len() < MIN_FRAME_SIZE || !validate(&self.buffer) {
                    return None;
                }

                let frame = Frame {
                    class,
                    bytes: self.buffer.clone(),
                };
                self.reset();
                Some(frame)
            }
        }
    }

    /// Feed multiple bytes
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<Frame> {
        bytes.iter().find_map(|&byte| self.feed(byte))
    }

    fn accept(&mut self, byte: u8, next: AssembleState) {
        // Header bytes always fit: the buffer holds at most three here
        let _ = self.buffer.push(byte);
        self.state = next;
    }

    fn expect(&mut self, matches: bool, byte: u8, next: AssembleState) {
        if matches {
            self.accept(byte, next);
        } else {
            self.resync(byte);
        }
    }

    fn resync(&mut self, _byte: u8) {
        #[cfg(feature = "defmt")]
        defmt::trace!("Resync: {=u8:#x} in {}", _byte, self.state);
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ADDR: DeviceAddress = DeviceAddress::new(0x01, 0x02);

    #[test]
    fn test_crc16_known_vector() {
        // CRC-16/MODBUS check value
        assert_eq!(crc16(b"123456789"), 0x4B37);
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn test_encode_layout() {
        let frame = Frame::encode(ADDR, CommandClass::Control, &[0x02]).unwrap();
        let bytes = frame.as_bytes();

        assert_eq!(bytes.len(), 7);
        assert_eq!(&bytes[..5], &[FRAME_START, 0x01, 0x02, 0x03, 0x02]);
        let crc = crc16(&bytes[..5]);
        assert_eq!(bytes[5], (crc & 0xFF) as u8);
        assert_eq!(bytes[6], (crc >> 8) as u8);
        assert_eq!(frame.checksum(), crc);
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::encode(ADDR, CommandClass::Read, &[0x02, 0x01, 0x40]).unwrap();

        assert_eq!(frame.address(), ADDR);
        assert_eq!(frame.class(), CommandClass::Read);
        assert_eq!(frame.payload(), &[0x02, 0x01, 0x40]);
        assert_eq!(frame.byte_at(6), Some(0x40));
        assert_eq!(frame.byte_at(7), None); // CRC low byte
    }

    #[test]
    fn test_validate_rejects_short_and_corrupt() {
        assert!(!validate(&[]));
        assert!(!validate(&[0xFF, 0xFF]));

        let frame = Frame::encode(ADDR, CommandClass::Control, &[0x03]).unwrap();
        let mut bytes = [0u8; 7];
        bytes.copy_from_slice(frame.as_bytes());
        assert!(validate(&bytes));

        bytes[4] ^= 0x01;
        assert!(!validate(&bytes));
    }

    #[test]
    fn test_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let result = Frame::encode(ADDR, CommandClass::Control, &payload);
        assert_eq!(result, Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_from_bytes_errors() {
        let frame = Frame::encode(ADDR, CommandClass::Control, &[0x01]).unwrap();
        let good = frame.as_bytes();
        assert_eq!(Frame::from_bytes(good), Ok(frame.clone()));

        assert_eq!(Frame::from_bytes(&good[..6]), Err(FrameError::TooShort));

        let mut bad = [0u8; 7];
        bad.copy_from_slice(good);
        bad[0] = 0xAA;
        assert_eq!(Frame::from_bytes(&bad), Err(FrameError::InvalidStart));

        bad.copy_from_slice(good);
        bad[3] = 0x02; // WRITE is never a valid reply class
        assert_eq!(Frame::from_bytes(&bad), Err(FrameError::InvalidClass));

        bad.copy_from_slice(good);
        bad[6] ^= 0xFF;
        assert_eq!(Frame::from_bytes(&bad), Err(FrameError::InvalidChecksum));
    }

    #[test]
    fn test_assembler_roundtrip() {
        let frame = Frame::encode(ADDR, CommandClass::Control, &[0x02]).unwrap();
        let mut assembler = FrameAssembler::new(ADDR);

        let parsed = assembler.feed_bytes(frame.as_bytes()).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_assembler_ignores_other_address() {
        let other = Frame::encode(DeviceAddress::new(0x01, 0x03), CommandClass::Control, &[0x01])
            .unwrap();
        let mut assembler = FrameAssembler::new(ADDR);

        assert_eq!(assembler.feed_bytes(other.as_bytes()), None);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_assembler_rejects_unknown_class() {
        let mut assembler = FrameAssembler::new(ADDR);
        for byte in [FRAME_START, 0x01, 0x02] {
            assert_eq!(assembler.feed(byte), None);
        }
        assert_eq!(assembler.pending(), 3);

        assembler.feed(0x02);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_header_mismatch_drops_offending_byte() {
        // A repeated START in the address slot is not taken as a new frame
        let frame = Frame::encode(ADDR, CommandClass::Control, &[0x03]).unwrap();
        let mut assembler = FrameAssembler::new(ADDR);

        assert_eq!(assembler.feed(FRAME_START), None);
        assert_eq!(assembler.feed(FRAME_START), None);
        assert_eq!(assembler.pending(), 0);

        assert_eq!(assembler.feed_bytes(frame.as_bytes()), Some(frame));
    }

    #[test]
    fn test_crc_mismatch_keeps_accumulating() {
        let mut assembler = FrameAssembler::new(ADDR);
        let bytes = [FRAME_START, 0x01, 0x02, 0x03, 0x04, 0x50, 0x00];
        assert_eq!(assembler.feed_bytes(&bytes), None);
        assert_eq!(assembler.pending(), 7);
    }

    #[test]
    fn test_longer_frame_completes_on_crc() {
        // Position report: nine bytes, CRC checked at lengths 7, 8 and 9
        let frame = Frame::encode(ADDR, CommandClass::Read, &[0x02, 0x01, 0x32]).unwrap();
        let mut assembler = FrameAssembler::new(ADDR);

        let (last, head) = frame.as_bytes().split_last().unwrap();
        assert_eq!(assembler.feed_bytes(head), None);
        assert_eq!(assembler.feed(*last), Some(frame));
    }

    #[test]
    fn test_overflow_resets() {
        let mut assembler = FrameAssembler::new(ADDR);
        assembler.feed_bytes(&[FRAME_START, 0x01, 0x02, 0x03]);

        // Constant filler never forms a valid CRC for this header
        let mut completed = false;
        for _ in 0..MAX_FRAME_SIZE {
            completed |= assembler.feed(0x00).is_some();
        }
        assert!(!completed);
        assert!(assembler.pending() < MAX_FRAME_SIZE);
    }

    #[test]
    fn test_reset_discards_partial() {
        let mut assembler = FrameAssembler::new(ADDR);
        assembler.feed_bytes(&[FRAME_START, 0x01, 0x02, 0x03, 0x01]);
        assert_eq!(assembler.pending(), 5);
        assembler.reset();
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_address_conversions() {
        let addr = DeviceAddress::from(0xFEDC);
        assert_eq!(addr.bytes(), [0xFE, 0xDC]);
        assert_eq!(addr.as_u16(), 0xFEDC);
    }

    /// True if some START in `noise` is still matching header bytes when
    /// the noise ends, or completes a full header for `ADDR`
    fn holds_header(noise: &[u8]) -> bool {
        let header = [FRAME_START, 0x01, 0x02];
        noise.iter().enumerate().any(|(i, &b)| {
            if b != FRAME_START {
                return false;
            }
            let rest = &noise[i..];
            let matched = rest
                .iter()
                .zip(header.iter())
                .take_while(|(got, want)| got == want)
                .count();
            matched == rest.len()
                || (matched == header.len() && CommandClass::from_byte(rest[3]).is_some())
        })
    }

    #[test]
    fn test_resync_inside_header() {
        // START cut off after one, two and three header bytes
        let frame = Frame::encode(ADDR, CommandClass::Read, &[0x05, 0x01, 0x00]).unwrap();
        let mut assembler = FrameAssembler::new(ADDR);
        let noise = [
            FRAME_START, 0x07,
            FRAME_START, 0x01, 0x09,
            FRAME_START, 0x01, 0x02, 0x02,
        ];

        for &byte in &noise {
            assert_eq!(assembler.feed(byte), None);
        }
        assert_eq!(assembler.pending(), 0);
        assert_eq!(assembler.feed_bytes(frame.as_bytes()), Some(frame));
    }

    proptest! {
        #[test]
        fn prop_encoded_frames_validate(
            addr in any::<u16>(),
            control in any::<bool>(),
            payload in prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
        ) {
            let class = if control { CommandClass::Control } else { CommandClass::Read };
            let frame = Frame::encode(DeviceAddress::from(addr), class, &payload).unwrap();
            prop_assert!(validate(frame.as_bytes()));
        }

        #[test]
        fn prop_resync_after_noise(
            noise in prop::collection::vec(
                prop_oneof![Just(FRAME_START), Just(0x01), Just(0x02), any::<u8>()],
                0..64,
            )
            .prop_filter("noise holds a header", |n| !holds_header(n)),
            control_code in 1u8..=3,
        ) {
            let frame = Frame::encode(ADDR, CommandClass::Control, &[control_code]).unwrap();
            let mut assembler = FrameAssembler::new(ADDR);

            let mut frames = 0;
            for &byte in noise.iter().chain(frame.as_bytes()) {
                if let Some(parsed) = assembler.feed(byte) {
                    prop_assert_eq!(&parsed, &frame);
                    frames += 1;
                }
            }
            prop_assert_eq!(frames, 1);
        }
    }
}
