use serde::{Deserialize, Serialize};

/// Equipment colour: the three-way verdict every decision in this crate
/// ultimately reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "apidocs", derive(utoipa::ToSchema))]
pub enum Colour {
    White,
    Grey,
    Black,
}

impl Colour {
    /// Value carried by the Diameter Equipment-Status AVP (1445): 0/2/1.
    pub fn equipment_status_avp(self) -> u32 {
        match self {
            Colour::White => 0,
            Colour::Black => 1,
            Colour::Grey => 2,
        }
    }

    /// Textual status used on the HTTP interface.
    pub fn http_status(self) -> &'static str {
        match self {
            Colour::White => "WHITELISTED",
            Colour::Grey => "GREYLISTED",
            Colour::Black => "BLACKLISTED",
        }
    }

    /// Parse the short insert codes `{b,g,w}` used by InsertImei.
    pub fn from_short_code(code: &str) -> Option<Colour> {
        match code {
            "w" => Some(Colour::White),
            "g" => Some(Colour::Grey),
            "b" => Some(Colour::Black),
            _ => None,
        }
    }

    /// Parse the long names used by InsertTac's `color` field.
    pub fn from_long_name(name: &str) -> Option<Colour> {
        match name {
            "white" => Some(Colour::White),
            "grey" | "gray" => Some(Colour::Grey),
            "black" => Some(Colour::Black),
            _ => None,
        }
    }
}
