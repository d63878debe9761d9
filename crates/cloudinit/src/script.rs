//! Script executor
//!
//! Drives the three declared groups of a bootstrap payload in order:
//! files first, then template expansions, then commands. The first failure
//! stops execution and is returned as-is; already-applied steps stay
//! applied.

use tracing::info;

use crate::config::{BootstrapConfig, FileEncoding, FileSpec};
use crate::error::CloudInitError;
use crate::executors::{CmdRunner, FileWriter, TemplateRenderer};

/// Executes a bootstrap script payload against the host.
pub struct ScriptExecutor<'a> {
    /// Writes declared files and rendered templates
    pub file_writer: &'a dyn FileWriter,
    /// Runs declared commands
    pub cmd_runner: &'a dyn CmdRunner,
    /// Expands declared templates
    pub template_renderer: &'a dyn TemplateRenderer,
}

impl std::fmt::Debug for ScriptExecutor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptExecutor").finish_non_exhaustive()
    }
}

impl ScriptExecutor<'_> {
    /// Parse and execute a raw bootstrap payload.
    pub async fn execute(&self, payload: &[u8]) -> Result<(), CloudInitError> {
        let config = BootstrapConfig::parse(payload)?;
        self.execute_config(&config).await
    }

    /// Execute an already-parsed bootstrap config.
    pub async fn execute_config(&self, config: &BootstrapConfig) -> Result<(), CloudInitError> {
        for file in &config.write_files {
            self.file_writer.write_file(file).await?;
        }

        for template in &config.templates {
            let source =
                tokio::fs::read_to_string(&template.source)
                    .await
                    .map_err(|e| CloudInitError::Template {
                        source_path: template.source.clone(),
                        detail: format!("failed to read template: {e}"),
                    })?;
            let rendered =
                self.template_renderer
                    .render(&template.source, &source, &template.data)?;
            self.file_writer
                .write_file(&FileSpec {
                    path: template.destination.clone(),
                    permissions: None,
                    encoding: FileEncoding::Plain,
                    append: false,
                    content: rendered,
                })
                .await?;
        }

        for cmd in &config.run_cmd {
            self.cmd_runner.run(cmd).await?;
        }

        info!(
            "Bootstrap script applied: {} files, {} templates, {} commands",
            config.write_files.len(),
            config.templates.len(),
            config.run_cmd.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCmdRunner, MockFileWriter, MockTemplateRenderer};

    fn executor<'a>(
        files: &'a MockFileWriter,
        cmds: &'a MockCmdRunner,
        templates: &'a MockTemplateRenderer,
    ) -> ScriptExecutor<'a> {
        ScriptExecutor {
            file_writer: files,
            cmd_runner: cmds,
            template_renderer: templates,
        }
    }

    #[tokio::test]
    async fn executes_files_before_commands() {
        let files = MockFileWriter::new();
        let cmds = MockCmdRunner::new();
        let templates = MockTemplateRenderer::new();
        let payload = br#"
write_files:
- path: /etc/kubeadm.yml
  content: 'kind: JoinConfiguration'
run_cmd:
- kubeadm join 10.0.0.1:6443
"#;

        let result = executor(&files, &cmds, &templates).execute(payload).await;

        assert!(result.is_ok(), "{result:?}");
        assert_eq!(files.written_paths(), vec!["/etc/kubeadm.yml"]);
        assert_eq!(cmds.commands(), vec!["kubeadm join 10.0.0.1:6443"]);
    }

    #[tokio::test]
    async fn halts_on_first_failing_file() {
        let files = MockFileWriter::new();
        files.fail_on("/etc/second.conf");
        let cmds = MockCmdRunner::new();
        let templates = MockTemplateRenderer::new();
        let payload = br#"
write_files:
- path: /etc/first.conf
  content: a
- path: /etc/second.conf
  content: b
- path: /etc/third.conf
  content: c
run_cmd:
- echo never-runs
"#;

        let result = executor(&files, &cmds, &templates).execute(payload).await;

        assert!(matches!(result, Err(CloudInitError::FileWrite { .. })));
        // First write landed, nothing after the failure ran
        assert_eq!(files.written_paths(), vec!["/etc/first.conf"]);
        assert!(cmds.commands().is_empty());
    }

    #[tokio::test]
    async fn halts_on_first_failing_command() {
        let files = MockFileWriter::new();
        let cmds = MockCmdRunner::new();
        cmds.fail_on("exit 1");
        let templates = MockTemplateRenderer::new();
        let payload = br#"
run_cmd:
- echo first
- exit 1
- echo never-runs
"#;

        let result = executor(&files, &cmds, &templates).execute(payload).await;

        assert!(matches!(result, Err(CloudInitError::CmdFailed { .. })));
        assert_eq!(cmds.commands(), vec!["echo first", "exit 1"]);
    }

    #[tokio::test]
    async fn missing_template_source_is_an_error() {
        let files = MockFileWriter::new();
        let cmds = MockCmdRunner::new();
        let templates = MockTemplateRenderer::new();
        let payload = br#"
templates:
- source: /does/not/exist.j2
  destination: /etc/out.conf
"#;

        let result = executor(&files, &cmds, &templates).execute(payload).await;

        assert!(matches!(result, Err(CloudInitError::Template { .. })));
        assert!(files.written_paths().is_empty());
    }

    #[tokio::test]
    async fn rendered_template_is_written_to_destination() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir")
        };
        let source = dir.path().join("motd.j2");
        assert!(std::fs::write(&source, "hello {{ name }}").is_ok());

        let files = MockFileWriter::new();
        let cmds = MockCmdRunner::new();
        let templates = MockTemplateRenderer::new();
        let payload = format!(
            "templates:\n- source: {}\n  destination: /etc/motd\n  data:\n    name: host-01\n",
            source.to_string_lossy()
        );

        let result = executor(&files, &cmds, &templates)
            .execute(payload.as_bytes())
            .await;

        assert!(result.is_ok(), "{result:?}");
        assert_eq!(files.written_paths(), vec!["/etc/motd"]);
        assert_eq!(
            templates.rendered_sources(),
            vec![source.to_string_lossy().to_string()]
        );
    }
}
