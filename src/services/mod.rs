/// Startup wiring from configuration to session and inputs.
pub mod bootstrap;
/// Moderator console parsing for the headless driver.
pub mod console;
/// Presentation flow controller.
pub mod controller;
/// Round-event forwarding to an MQTT broker.
#[cfg(feature = "mqtt")]
pub mod effects;
