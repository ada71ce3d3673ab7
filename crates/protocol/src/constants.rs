/// Zero-based index of the topic segment that names the channel.
pub const CHANNEL_SEGMENT: usize = 3;

/// Topic level separator.
pub const TOPIC_SEPARATOR: char = '/';

/// Payload field holding the reading.
pub const VALUE_FIELD: &str = "value";

/// Value recorded when the payload has no usable `value` field.
pub const DEFAULT_VALUE: f64 = 0.0;

/// Standard unencrypted MQTT port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Topics published by the living-room ESP32 node.
pub const DEFAULT_TOPICS: [&str; 2] = [
    "sensors/esp32/esp32_living_room/temperature",
    "sensors/esp32/esp32_living_room/humidity",
];
