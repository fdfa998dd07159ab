//! The line-oriented wire protocol.
//!
//! Every packet is a newline-free UTF-8 string whose first four bytes are a
//! fixed-width code. The remainder is the payload: `|`-separated fields,
//! with `:`-separated sub-fields where a field is an id/value group.
//!
//! POS3 and SCOR carry absolute state and are safe to re-apply; POS1, POW1
//! and POW2 are incremental and are not. The transport is trusted to
//! deliver each line whole, in order, at most once.

use crate::entity::Direction;
use crate::powerup::PowerUpKind;
use thiserror::Error;

pub const CODE_LEN: usize = 4;
pub const MOVEMENT_CODE: &str = "POS1";
pub const POSITIONS_CODE: &str = "POS3";
pub const INVENTORY_CODE: &str = "POW0";
pub const ACTIVATE_CODE: &str = "POW1";
pub const TRAP_CODE: &str = "POW2";
pub const SCORE_CODE: &str = "SCOR";
pub const STOP_CODE: &str = "STOP";

/// Codes the incoming pipeline will route to telemetry.
pub const KNOWN_CODES: [&str; 7] = [
    MOVEMENT_CODE,
    POSITIONS_CODE,
    INVENTORY_CODE,
    ACTIVATE_CODE,
    TRAP_CODE,
    SCORE_CODE,
    STOP_CODE,
];

/// A fault in an individual packet. Recoverable: the packet is logged and
/// discarded, the pipeline keeps draining.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("packet shorter than a 4-byte code: {0:?}")]
    Truncated(String),
    #[error("unrecognised packet code: {0:?}")]
    UnknownCode(String),
    #[error("malformed {context} payload: {detail}")]
    Malformed {
        context: &'static str,
        detail: String,
    },
}

fn malformed(context: &'static str, detail: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed {
        context,
        detail: detail.into(),
    }
}

fn parse_usize(context: &'static str, field: &str) -> Result<usize, ProtocolError> {
    field
        .parse::<usize>()
        .map_err(|e| malformed(context, format!("{field:?}: {e}")))
}

fn parse_u32(context: &'static str, field: &str) -> Result<u32, ProtocolError> {
    field
        .parse::<u32>()
        .map_err(|e| malformed(context, format!("{field:?}: {e}")))
}

fn parse_f64(context: &'static str, field: &str) -> Result<f64, ProtocolError> {
    field
        .parse::<f64>()
        .map_err(|e| malformed(context, format!("{field:?}: {e}")))
}

fn parse_direction(context: &'static str, field: &str) -> Result<Direction, ProtocolError> {
    let tag = field
        .parse::<i32>()
        .map_err(|e| malformed(context, format!("{field:?}: {e}")))?;
    Direction::from_int(tag).ok_or_else(|| malformed(context, format!("direction tag {tag}")))
}

fn parse_power_up(context: &'static str, field: &str) -> Result<PowerUpKind, ProtocolError> {
    let tag = field
        .parse::<i32>()
        .map_err(|e| malformed(context, format!("{field:?}: {e}")))?;
    PowerUpKind::from_int(tag).ok_or_else(|| malformed(context, format!("power-up tag {tag}")))
}

/// One locally captured control: which client wants to face which way.
/// Serialised as `clientId:directionInt`, the same sub-field group POS1
/// opens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub client_id: usize,
    pub direction: Direction,
}

impl Input {
    pub fn new(client_id: usize, direction: Direction) -> Self {
        Self {
            client_id,
            direction,
        }
    }

    pub fn to_wire(&self) -> String {
        format!("{}:{}", self.client_id, self.direction.to_int())
    }

    pub fn from_wire(raw: &str) -> Result<Input, ProtocolError> {
        let mut parts = raw.split(':');
        let (Some(id), Some(dir), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed("input", format!("{raw:?}")));
        };
        Ok(Input {
            client_id: parse_usize("input", id)?,
            direction: parse_direction("input", dir)?,
        })
    }
}

/// One entity's slot in a POS3 snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPosition {
    pub id: usize,
    pub direction: Direction,
    pub x: f64,
    pub y: f64,
}

/// A decoded packet, one variant per wire code.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// POS1: one entity moved; incremental.
    Movement {
        input: Input,
        x: f64,
        y: f64,
        mipsman_id: usize,
    },
    /// POS3: full position/direction snapshot; absolute.
    Positions {
        entities: Vec<EntityPosition>,
        mipsman_id: usize,
    },
    /// POW0: inventory grants, applied only by the matching client.
    Inventory { grants: Vec<(usize, PowerUpKind)> },
    /// POW1: a power-up was activated at a location; incremental.
    Activate {
        client_id: usize,
        kind: PowerUpKind,
        x: f64,
        y: f64,
    },
    /// POW2: a trap box appeared at a cell; incremental.
    TrapBox { x: f64, y: f64 },
    /// SCOR: authoritative scores, positional by entity index; absolute.
    Scores { scores: Vec<u32> },
    /// STOP: session end.
    Stop,
}

impl Packet {
    pub fn code(&self) -> &'static str {
        match self {
            Packet::Movement { .. } => MOVEMENT_CODE,
            Packet::Positions { .. } => POSITIONS_CODE,
            Packet::Inventory { .. } => INVENTORY_CODE,
            Packet::Activate { .. } => ACTIVATE_CODE,
            Packet::TrapBox { .. } => TRAP_CODE,
            Packet::Scores { .. } => SCORE_CODE,
            Packet::Stop => STOP_CODE,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Packet::Movement {
                input,
                x,
                y,
                mipsman_id,
            } => format!("{MOVEMENT_CODE}{}|{x}|{y}|{mipsman_id}", input.to_wire()),
            Packet::Positions {
                entities,
                mipsman_id,
            } => {
                let mut fields: Vec<String> = entities
                    .iter()
                    .map(|e| format!("{}:{}:{}:{}", e.id, e.direction.to_int(), e.x, e.y))
                    .collect();
                fields.push(mipsman_id.to_string());
                format!("{POSITIONS_CODE}{}", fields.join("|"))
            }
            Packet::Inventory { grants } => {
                let fields: Vec<String> = grants
                    .iter()
                    .map(|(id, kind)| format!("{id}:{}", kind.to_int()))
                    .collect();
                format!("{INVENTORY_CODE}{}", fields.join("|"))
            }
            Packet::Activate {
                client_id,
                kind,
                x,
                y,
            } => format!("{ACTIVATE_CODE}{client_id}|{}|{x}|{y}", kind.to_int()),
            Packet::TrapBox { x, y } => format!("{TRAP_CODE}{x}|{y}"),
            Packet::Scores { scores } => {
                let fields: Vec<String> = scores.iter().map(|s| s.to_string()).collect();
                format!("{SCORE_CODE}{}", fields.join("|"))
            }
            Packet::Stop => STOP_CODE.to_string(),
        }
    }

    /// Splits off the 4-byte code and parses the payload it announces.
    pub fn decode(raw: &str) -> Result<Packet, ProtocolError> {
        if raw.len() < CODE_LEN || !raw.is_char_boundary(CODE_LEN) {
            return Err(ProtocolError::Truncated(raw.to_string()));
        }
        let (code, payload) = raw.split_at(CODE_LEN);
        match code {
            MOVEMENT_CODE => Self::decode_movement(payload),
            POSITIONS_CODE => Self::decode_positions(payload),
            INVENTORY_CODE => Self::decode_inventory(payload),
            ACTIVATE_CODE => Self::decode_activate(payload),
            TRAP_CODE => Self::decode_trap(payload),
            SCORE_CODE => Self::decode_scores(payload),
            STOP_CODE => Ok(Packet::Stop),
            _ => Err(ProtocolError::UnknownCode(raw.to_string())),
        }
    }

    fn decode_movement(payload: &str) -> Result<Packet, ProtocolError> {
        let fields: Vec<&str> = payload.split('|').collect();
        if fields.len() != 4 {
            return Err(malformed(
                MOVEMENT_CODE,
                format!("expected 4 fields, got {}", fields.len()),
            ));
        }
        Ok(Packet::Movement {
            input: Input::from_wire(fields[0])?,
            x: parse_f64(MOVEMENT_CODE, fields[1])?,
            y: parse_f64(MOVEMENT_CODE, fields[2])?,
            mipsman_id: parse_usize(MOVEMENT_CODE, fields[3])?,
        })
    }

    fn decode_positions(payload: &str) -> Result<Packet, ProtocolError> {
        let fields: Vec<&str> = payload.split('|').collect();
        if fields.len() < 2 {
            return Err(malformed(
                POSITIONS_CODE,
                format!("expected entity groups and a mipsman id, got {payload:?}"),
            ));
        }
        let mipsman_id = parse_usize(POSITIONS_CODE, fields[fields.len() - 1])?;
        let mut entities = Vec::with_capacity(fields.len() - 1);
        for group in &fields[..fields.len() - 1] {
            let parts: Vec<&str> = group.split(':').collect();
            if parts.len() != 4 {
                return Err(malformed(
                    POSITIONS_CODE,
                    format!("entity group {group:?}"),
                ));
            }
            entities.push(EntityPosition {
                id: parse_usize(POSITIONS_CODE, parts[0])?,
                direction: parse_direction(POSITIONS_CODE, parts[1])?,
                x: parse_f64(POSITIONS_CODE, parts[2])?,
                y: parse_f64(POSITIONS_CODE, parts[3])?,
            });
        }
        Ok(Packet::Positions {
            entities,
            mipsman_id,
        })
    }

    fn decode_inventory(payload: &str) -> Result<Packet, ProtocolError> {
        let mut grants = Vec::new();
        for group in payload.split('|') {
            let parts: Vec<&str> = group.split(':').collect();
            if parts.len() != 2 {
                return Err(malformed(INVENTORY_CODE, format!("grant {group:?}")));
            }
            grants.push((
                parse_usize(INVENTORY_CODE, parts[0])?,
                parse_power_up(INVENTORY_CODE, parts[1])?,
            ));
        }
        Ok(Packet::Inventory { grants })
    }

    fn decode_activate(payload: &str) -> Result<Packet, ProtocolError> {
        let fields: Vec<&str> = payload.split('|').collect();
        if fields.len() != 4 {
            return Err(malformed(
                ACTIVATE_CODE,
                format!("expected 4 fields, got {}", fields.len()),
            ));
        }
        Ok(Packet::Activate {
            client_id: parse_usize(ACTIVATE_CODE, fields[0])?,
            kind: parse_power_up(ACTIVATE_CODE, fields[1])?,
            x: parse_f64(ACTIVATE_CODE, fields[2])?,
            y: parse_f64(ACTIVATE_CODE, fields[3])?,
        })
    }

    fn decode_trap(payload: &str) -> Result<Packet, ProtocolError> {
        let fields: Vec<&str> = payload.split('|').collect();
        if fields.len() != 2 {
            return Err(malformed(
                TRAP_CODE,
                format!("expected 2 fields, got {}", fields.len()),
            ));
        }
        Ok(Packet::TrapBox {
            x: parse_f64(TRAP_CODE, fields[0])?,
            y: parse_f64(TRAP_CODE, fields[1])?,
        })
    }

    fn decode_scores(payload: &str) -> Result<Packet, ProtocolError> {
        let scores = payload
            .split('|')
            .map(|field| parse_u32(SCORE_CODE, field))
            .collect::<Result<Vec<u32>, ProtocolError>>()?;
        Ok(Packet::Scores { scores })
    }
}
