//! Command codes, AVP codes, and well-known IDs for the S13 command set
//! (3GPP TS 29.272) layered on the Diameter base protocol (RFC 6733).

pub const COMMAND_CAPABILITIES_EXCHANGE: u32 = 257;
pub const COMMAND_DEVICE_WATCHDOG: u32 = 280;
pub const COMMAND_DISCONNECT_PEER: u32 = 282;
pub const COMMAND_ME_IDENTITY_CHECK: u32 = 324;

pub const APPLICATION_ID_S13: u32 = 16777252;
pub const VENDOR_ID_3GPP: u32 = 10415;

pub const AVP_SESSION_ID: u32 = 263;
pub const AVP_ORIGIN_HOST: u32 = 264;
pub const AVP_ORIGIN_REALM: u32 = 296;
pub const AVP_RESULT_CODE: u32 = 268;
pub const AVP_PRODUCT_NAME: u32 = 269;
pub const AVP_AUTH_SESSION_STATE: u32 = 277;
pub const AVP_VENDOR_ID: u32 = 266;
pub const AVP_SUPPORTED_VENDOR_ID: u32 = 265;
pub const AVP_VENDOR_SPECIFIC_APPLICATION_ID: u32 = 260;
pub const AVP_AUTH_APPLICATION_ID: u32 = 258;
pub const AVP_TERMINAL_INFORMATION: u32 = 1401;
pub const AVP_IMEI: u32 = 1402;
pub const AVP_SOFTWARE_VERSION: u32 = 1403;
pub const AVP_EQUIPMENT_STATUS: u32 = 1445;

pub const RESULT_DIAMETER_SUCCESS: u32 = 2001;
pub const RESULT_DIAMETER_UNABLE_TO_COMPLY: u32 = 5012;
pub const RESULT_DIAMETER_INVALID_AVP_VALUE: u32 = 5004;

pub const AUTH_SESSION_STATE_NO_STATE_MAINTAINED: u32 = 1;

/// Equipment-Status AVP (1445) enumerated values.
pub const EQUIPMENT_STATUS_WHITELISTED: u32 = 0;
pub const EQUIPMENT_STATUS_BLACKLISTED: u32 = 1;
pub const EQUIPMENT_STATUS_GREYLISTED: u32 = 2;
