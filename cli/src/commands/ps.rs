//! `jdig ps`: list JVMs that can be attached to.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::locator;
use crate::infra::hsperf::{HsperfProcessSource, has_perf_data};

/// Run the ps command.
///
/// # Errors
///
/// Returns an error if `/tmp` cannot be read.
pub fn run(app: &AppContext) -> Result<()> {
    let source = HsperfProcessSource::default();
    let processes = locator::list(&source, std::process::id())?;
    app.renderer().render_process_list(&processes)?;

    if processes.is_empty() && !app.is_json() && !has_perf_data(source.tmp_dir()) {
        app.output.info(&format!(
            "No hsperfdata directories in {}. JVMs started with -XX:-UsePerfData are not listed.",
            source.tmp_dir().display()
        ));
    }
    Ok(())
}
