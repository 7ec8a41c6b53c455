use serde::Serialize;
use std::io::{self, Write};

#[derive(clap::Args, Clone, Debug, Default)]
pub struct Output {
    /// How to format CLI output
    #[clap(global = true, short, long, value_enum)]
    pub output: Option<OutputType>,
}

#[derive(clap::ValueEnum, Debug, Copy, Clone, PartialEq)]
pub enum OutputType {
    /// Format output as compact JSON
    Json,
    /// Format output as YAML
    Yaml,
}

impl Output {
    pub fn write<T: Serialize>(&self, item: &T) -> anyhow::Result<()> {
        match self.output.unwrap_or(OutputType::Json) {
            OutputType::Json => print_json(item),
            OutputType::Yaml => print_yaml(item),
        }
    }
}

pub fn print_yaml(item: &impl Serialize) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_yaml::to_writer(&mut stdout, item)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

pub fn print_json(item: &impl Serialize) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, item)?;
    stdout.write_all(b"\n")?;
    Ok(())
}
