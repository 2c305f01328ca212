use anyhow::Result;
use serde::Serialize;

use crate::output::types::{Envelope, Meta};
use super::sink::current_sink;

pub fn print_plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::plan(op, plan, meta)?;
    current_sink().on_plan(&env)
}

pub fn print_result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::result(op, result, meta)?;
    current_sink().on_result(&env)
}
