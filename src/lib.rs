// Library exports for aggplot

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod parser;
pub mod telemetry;
pub mod translate;

// Pipeline stages
pub mod ir;
pub mod resolve;
pub mod walk;
pub mod derive;
pub mod complete;
pub mod rank;
pub mod assemble;

pub use config::{
    ChartAction, ChartConfig, ChartConfigLookup, ChartConfigStore, ComputedField, Order,
};
pub use data::{AggregateDto, ChartType, Data, Plot};
pub use derive::{add_computed_field, percentage_of, percentage_value, Ratio, PERCENTAGE_SYMBOL};
pub use complete::append_missing_plot;
pub use error::{ConfigError, TranslateError, TranslateResult};
pub use translate::Translator;
