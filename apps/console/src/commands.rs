//! Console input parsed into controller-bound commands.

use shared::domain::KpiId;

pub const USAGE: &str = "commands: refresh | filter <department_id|all> | departments | \
submit <kpi_id> <value> [target] | show | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Refresh,
    Filter { value: String },
    Departments,
    Submit {
        kpi_id: KpiId,
        value: f64,
        target: Option<f64>,
    },
    Show,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<ConsoleCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(keyword) = parts.next() else {
        return Err(USAGE.to_string());
    };
    match keyword {
        "refresh" => Ok(ConsoleCommand::Refresh),
        // A bare `filter` clears the constraint, same as `filter all`.
        "filter" => Ok(ConsoleCommand::Filter {
            value: parts.next().unwrap_or("").to_string(),
        }),
        "departments" => Ok(ConsoleCommand::Departments),
        "submit" => {
            let kpi_id = parts
                .next()
                .ok_or_else(|| "usage: submit <kpi_id> <value> [target]".to_string())?
                .parse::<i64>()
                .map_err(|err| format!("invalid kpi id: {err}"))?;
            let value = parts
                .next()
                .ok_or_else(|| "usage: submit <kpi_id> <value> [target]".to_string())?
                .parse::<f64>()
                .map_err(|err| format!("invalid value: {err}"))?;
            let target = match parts.next() {
                Some(raw) => Some(
                    raw.parse::<f64>()
                        .map_err(|err| format!("invalid target: {err}"))?,
                ),
                None => None,
            };
            Ok(ConsoleCommand::Submit {
                kpi_id: KpiId(kpi_id),
                value,
                target,
            })
        }
        "show" => Ok(ConsoleCommand::Show),
        "help" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(format!("unknown command: {other}\n{USAGE}")),
    }
}
