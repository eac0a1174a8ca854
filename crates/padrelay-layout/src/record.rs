//! The controller state record.

use serde::{Deserialize, Deserializer, Serialize};

/// A named 8-bit field of a [`StateRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    North,
    East,
    South,
    West,
    LeftBumper,
    RightBumper,
    LeftStick,
    RightStick,
    Select,
    Start,
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
    DPadX,
    DPadY,
}

/// Wire names of every field, in record order. The single source of truth
/// for name resolution.
const FIELD_NAMES: [(&str, Field); 18] = [
    ("N", Field::North),
    ("E", Field::East),
    ("S", Field::South),
    ("W", Field::West),
    ("LB", Field::LeftBumper),
    ("RB", Field::RightBumper),
    ("LS", Field::LeftStick),
    ("RS", Field::RightStick),
    ("SELECT", Field::Select),
    ("START", Field::Start),
    ("LjoyX", Field::LeftX),
    ("LjoyY", Field::LeftY),
    ("RjoyX", Field::RightX),
    ("RjoyY", Field::RightY),
    ("LT", Field::LeftTrigger),
    ("RT", Field::RightTrigger),
    ("dX", Field::DPadX),
    ("dY", Field::DPadY),
];

impl Field {
    /// Every field, in record order.
    pub const ALL: [Field; 18] = [
        Field::North,
        Field::East,
        Field::South,
        Field::West,
        Field::LeftBumper,
        Field::RightBumper,
        Field::LeftStick,
        Field::RightStick,
        Field::Select,
        Field::Start,
        Field::LeftX,
        Field::LeftY,
        Field::RightX,
        Field::RightY,
        Field::LeftTrigger,
        Field::RightTrigger,
        Field::DPadX,
        Field::DPadY,
    ];

    /// Resolve a wire name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Field> {
        FIELD_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, field)| *field)
    }

    /// The wire name of this field.
    pub fn name(self) -> &'static str {
        FIELD_NAMES
            .iter()
            .find(|(_, field)| *field == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }
}

/// One snapshot of controller input.
///
/// Every field is always present. Keys missing from the JSON encoding, or set
/// to `null`, decode as zero; values outside a field's range are rejected.
/// Keys are matched case-sensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateRecord {
    #[serde(rename = "N", deserialize_with = "nullable")]
    pub north: u8,
    #[serde(rename = "E", deserialize_with = "nullable")]
    pub east: u8,
    #[serde(rename = "S", deserialize_with = "nullable")]
    pub south: u8,
    #[serde(rename = "W", deserialize_with = "nullable")]
    pub west: u8,
    #[serde(rename = "LB", deserialize_with = "nullable")]
    pub left_bumper: u8,
    #[serde(rename = "RB", deserialize_with = "nullable")]
    pub right_bumper: u8,
    #[serde(rename = "LS", deserialize_with = "nullable")]
    pub left_stick: u8,
    #[serde(rename = "RS", deserialize_with = "nullable")]
    pub right_stick: u8,
    #[serde(rename = "SELECT", deserialize_with = "nullable")]
    pub select: u8,
    #[serde(rename = "START", deserialize_with = "nullable")]
    pub start: u8,

    #[serde(rename = "LjoyX", deserialize_with = "nullable")]
    pub left_x: u8,
    #[serde(rename = "LjoyY", deserialize_with = "nullable")]
    pub left_y: u8,
    #[serde(rename = "RjoyX", deserialize_with = "nullable")]
    pub right_x: u8,
    #[serde(rename = "RjoyY", deserialize_with = "nullable")]
    pub right_y: u8,
    #[serde(rename = "LT", deserialize_with = "nullable")]
    pub left_trigger: u8,
    #[serde(rename = "RT", deserialize_with = "nullable")]
    pub right_trigger: u8,
    #[serde(rename = "dX", deserialize_with = "nullable")]
    pub dpad_x: i8,
    #[serde(rename = "dY", deserialize_with = "nullable")]
    pub dpad_y: i8,

    /// Producer clock, milliseconds since the Unix epoch. Not validated.
    #[serde(rename = "ts", deserialize_with = "nullable")]
    pub timestamp: i64,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl StateRecord {
    /// Raw 8-bit value of a field. Signed fields return their bit pattern.
    pub fn get(&self, field: Field) -> u8 {
        match field {
            Field::North => self.north,
            Field::East => self.east,
            Field::South => self.south,
            Field::West => self.west,
            Field::LeftBumper => self.left_bumper,
            Field::RightBumper => self.right_bumper,
            Field::LeftStick => self.left_stick,
            Field::RightStick => self.right_stick,
            Field::Select => self.select,
            Field::Start => self.start,
            Field::LeftX => self.left_x,
            Field::LeftY => self.left_y,
            Field::RightX => self.right_x,
            Field::RightY => self.right_y,
            Field::LeftTrigger => self.left_trigger,
            Field::RightTrigger => self.right_trigger,
            Field::DPadX => self.dpad_x as u8,
            Field::DPadY => self.dpad_y as u8,
        }
    }

    /// Set a field from its raw 8-bit value. Signed fields take the bit pattern.
    pub fn set(&mut self, field: Field, raw: u8) {
        let slot = match field {
            Field::North => &mut self.north,
            Field::East => &mut self.east,
            Field::South => &mut self.south,
            Field::West => &mut self.west,
            Field::LeftBumper => &mut self.left_bumper,
            Field::RightBumper => &mut self.right_bumper,
            Field::LeftStick => &mut self.left_stick,
            Field::RightStick => &mut self.right_stick,
            Field::Select => &mut self.select,
            Field::Start => &mut self.start,
            Field::LeftX => &mut self.left_x,
            Field::LeftY => &mut self.left_y,
            Field::RightX => &mut self.right_x,
            Field::RightY => &mut self.right_y,
            Field::LeftTrigger => &mut self.left_trigger,
            Field::RightTrigger => &mut self.right_trigger,
            Field::DPadX => {
                self.dpad_x = raw as i8;
                return;
            }
            Field::DPadY => {
                self.dpad_y = raw as i8;
                return;
            }
        };
        *slot = raw;
    }

    /// Builder-style [`StateRecord::set`].
    pub fn with(mut self, field: Field, raw: u8) -> Self {
        self.set(field, raw);
        self
    }
}

impl std::fmt::Display for StateRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Btns[N:{} E:{} S:{} W:{}] Joy[LX:{} LY:{} RX:{} RY:{}] Trig[L:{} R:{}]",
            self.north,
            self.east,
            self.south,
            self.west,
            self.left_x,
            self.left_y,
            self.right_x,
            self.right_y,
            self.left_trigger,
            self.right_trigger
        )
    }
}
