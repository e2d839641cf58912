//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | SensorPort         | DS18B20 thermometer          |
//! |                | ActuatorPort       | Cooling relay (sysfs GPIO)   |
//! | `log_sink`     | EventSink          | `log` output                 |
//! | `target_file`  | TargetPort         | Operator target file         |
//! | `config_file`  | ConfigPort         | JSON config document         |
//! | `report`       | EventSink          | Report worker thread         |
//! | `outbox`       | ReportSink         | Mailer pickup directory      |
//! | `csv_renderer` | Renderer           | CSV attachment               |
//! | `time`         | ClockPort          | System wall clock            |

pub mod config_file;
pub mod csv_renderer;
pub mod hardware;
pub mod log_sink;
pub mod outbox;
pub mod report;
pub mod target_file;
pub mod time;
