/**
 * How long (milliseconds) to wait before polling the broker connection again after it failed.
 */
pub const RECONNECT_DELAY: u64 = 1000;

/**
 * How long (milliseconds) a dispatch may wait for the broker connection by default.
 */
pub const CONNECT_TIMEOUT: u64 = 30_000;

/**
 * MQTT keep alive interval (seconds).
 */
pub const KEEP_ALIVE: u64 = 60;

/**
 * Smallest keep alive interval (seconds) the MQTT client accepts.
 */
pub const MIN_KEEP_ALIVE: u64 = 5;

/**
 * Capacity of the request queue between the client handle and the event loop.
 */
pub const REQUEST_CAPACITY: usize = 64;

/**
 * How long (seconds) the panel is busy after selecting a dim scene.
 * The hardware needs this long to start the dimming program.
 */
pub const BUSY_WINDOW: u64 = 40;

pub const PROTOCOL_ID: &str = "MQTT";
pub const PROTOCOL_VERSION: u8 = 5;

/**
 * Path the broker serves MQTT on.
 */
pub const MQTT_PATH: &str = "/mqtt";

pub const CLIENT_ID_PREFIX: &str = "lightpanel_";

/**
 * Number of random hex characters appended to the client id prefix.
 */
pub const CLIENT_ID_RANDOM_LEN: usize = 6;

pub const TOPIC_SCENE: &str = "vl/dmx/wawasan/rx";
pub const TOPIC_SAVE: &str = "lampu";
pub const TOPIC_ON: &str = "on";
pub const TOPIC_OFF: &str = "off";
