use std::path::PathBuf;

use anyhow::Context;
use domain::model::vo::JobScript;
use domain::service::JobFileBuilder;
use indexmap::IndexMap;
use indoc::formatdoc;

/// Writes job files as plain shell scripts.
#[derive(Debug, Default)]
pub struct ScriptJobFileBuilder;

#[async_trait::async_trait]
impl JobFileBuilder for ScriptJobFileBuilder {
    async fn write(&self, script: JobScript) -> anyhow::Result<PathBuf> {
        let text = render(&script);
        tokio::fs::write(&script.path, text)
            .await
            .with_context(|| format!("Cannot write job file {}", script.path.display()))?;
        tracing::debug!(task_id = %script.task_id, "Wrote job file {}", script.path.display());
        Ok(script.path)
    }
}

fn render(script: &JobScript) -> String {
    let shell = &script.shell;
    let task_id = &script.task_id;
    let batch_system = &script.batch_system;

    let header = lines(script.directives.iter().cloned());

    let mut setup = Vec::new();
    if let Some(redirect) = &script.output_redirect {
        setup.push(format!(
            "exec >{} 2>{}",
            double_quote(&redirect.stdout.to_string_lossy()),
            double_quote(&redirect.stderr.to_string_lossy())
        ));
    }
    if script.remote {
        let dirs = [
            ("JOB_TOOL_DIR", &script.remote_tool_dir),
            ("JOB_SUITE_DIR", &script.remote_suite_dir),
        ];
        for (name, dir) in dirs {
            if let Some(dir) = dir {
                setup.push(format!("export {name}={}", double_quote(&dir.to_string_lossy())));
            }
        }
    }
    setup.extend(exports(&script.global_environment));
    setup.extend(exports(&script.environment));
    let setup = lines(setup);

    // Simulated jobs only run their stub.
    let hooks = !script.simulation_mode;
    let body = lines(
        [
            hooks.then_some(script.global_pre_script.as_deref()).flatten(),
            hooks.then_some(script.pre_script.as_deref()).flatten(),
            Some(script.command.as_str()),
            hooks.then_some(script.post_script.as_deref()).flatten(),
            hooks.then_some(script.global_post_script.as_deref()).flatten(),
        ]
        .into_iter()
        .flatten()
        .map(|part| part.trim_end().to_owned()),
    );

    formatdoc! {"
        #!{shell}
        {header}
        # Task {task_id}, submitted through {batch_system}
        {setup}
        {body}"
    }
}

/// Every line followed by a newline.
fn lines(lines: impl IntoIterator<Item = String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

fn exports(environment: &IndexMap<String, String>) -> impl Iterator<Item = String> + '_ {
    environment
        .iter()
        .map(|(key, value)| format!("export {key}={}", double_quote(value)))
}

/// Quote for the shell but still let `$VAR` expand, so a variable may refer to
/// those exported before it.
fn double_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
