//! `axiom solve`: one problem, one answer, then exit.

use anyhow::{Result, bail};
use axiom_application::render::{UnicodeTypesetter, render_record};
use axiom_application::{AppController, ViewState};

use crate::context::AppContext;
use crate::display;

pub async fn run(context: &AppContext, problem: &[String]) -> Result<()> {
    let problem = problem.join(" ");
    if problem.trim().is_empty() {
        bail!("Problem text must not be empty");
    }

    let solver = context.solver()?;
    let mut controller = AppController::new(solver, context.repository()?);

    display::print_loading();
    controller.submit(problem).await;

    match controller.state() {
        ViewState::Showing(record) => {
            display::print_view(&render_record(&record, &UnicodeTypesetter));
            Ok(())
        }
        ViewState::Error(message) => {
            display::print_error(&message);
            bail!("Calculation failed")
        }
        other => bail!("Unexpected state after solve: {:?}", other),
    }
}
