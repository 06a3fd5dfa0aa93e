//! Output rendering and formatting

use std::io;
use std::time::Duration;

use comfy_table::{presets::NOTHING, Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use pinstall_errors::UserFacingError;
use pinstall_types::{ColorChoice, InstallReport, Package};

/// Result of a command, rendered once it finishes
#[derive(Debug)]
pub enum OperationResult {
    PackageList(Vec<Package>),
    InstallReport(InstallReport),
}

/// Output renderer for CLI results
#[derive(Clone, Debug)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Skip install summaries
    quiet: bool,
    color_choice: ColorChoice,
}

impl OutputRenderer {
    pub fn new(json_output: bool, quiet: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            quiet,
            color_choice,
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            println!("{}", self.render_json(result)?);
            return Ok(());
        }

        match result {
            OperationResult::PackageList(packages) => {
                println!("{}", self.package_table(packages));
            }
            OperationResult::InstallReport(report) => {
                if !self.quiet {
                    print!("{}", self.install_summary(report));
                }
            }
        }
        Ok(())
    }

    fn render_json(&self, result: &OperationResult) -> io::Result<String> {
        let json = match result {
            OperationResult::PackageList(packages) => serde_json::to_string_pretty(packages),
            OperationResult::InstallReport(report) => serde_json::to_string_pretty(report),
        };
        json.map_err(io::Error::other)
    }

    /// Borderless NAME / VERSION / DESCRIPTION table
    pub fn package_table(&self, packages: &[Package]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(NOTHING)
            .set_content_arrangement(ContentArrangement::Disabled);
        if self.color_choice == ColorChoice::Always {
            table.enforce_styling();
        }

        table.set_header(vec![
            self.header_cell("NAME"),
            self.header_cell("VERSION"),
            self.header_cell("DESCRIPTION"),
        ]);
        for package in packages {
            table.add_row(vec![
                Cell::new(&package.name),
                Cell::new(&package.version),
                Cell::new(&package.description),
            ]);
        }
        table
    }

    /// Summary printed after an install
    pub fn install_summary(&self, report: &InstallReport) -> String {
        let mut out = format!(
            "Installed {} packages in {}\n",
            report.installed.len(),
            format_duration(Duration::from_millis(report.duration_ms))
        );

        if !report.failed.is_empty() {
            out.push_str(&format!("\nFailed ({}):\n", report.failed.len()));
            for failure in &report.failed {
                let name = if self.color_choice == ColorChoice::Never {
                    failure.name.clone()
                } else {
                    style(&failure.name).red().to_string()
                };
                out.push_str(&format!(
                    "  • {name} {}: {}\n",
                    failure.version,
                    failure.error.user_message()
                ));
            }
        }
        out
    }

    fn header_cell(&self, title: &str) -> Cell {
        let cell = Cell::new(title);
        if self.color_choice == ColorChoice::Never {
            cell
        } else {
            cell.add_attribute(Attribute::Bold).fg(Color::Reset)
        }
    }
}

/// Format an elapsed time for humans
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinstall_errors::{Error, NetworkError};
    use pinstall_types::{InstalledPackage, PackageFailure};
    use std::path::PathBuf;

    fn renderer() -> OutputRenderer {
        OutputRenderer::new(false, false, ColorChoice::Never)
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_package_table() {
        let mut package = Package::new("psr/log", "3.0.0", "https://example.com/log.zip");
        package.description = "Common interface for logging libraries".to_string();

        let rendered = renderer().package_table(&[package]).to_string();
        let mut lines = rendered.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("NAME") && header.contains("VERSION") && header.contains("DESCRIPTION"));
        let row = lines.next().unwrap();
        assert!(row.contains("psr/log"));
        assert!(row.contains("3.0.0"));
        assert!(row.contains("Common interface for logging libraries"));
    }

    #[test]
    fn test_install_summary_lists_failures() {
        let report = InstallReport {
            installed: vec![InstalledPackage {
                name: "psr/log".to_string(),
                version: "3.0.0".to_string(),
                path: PathBuf::from("vendor/psr/log"),
            }],
            failed: vec![PackageFailure {
                name: "acme/broken".to_string(),
                version: "1.0.0".to_string(),
                error: Error::from(NetworkError::HttpError {
                    status: 404,
                    message: "404 Not Found".to_string(),
                }),
            }],
            target: PathBuf::from("vendor"),
            manifest: PathBuf::from("vendor/composer/installed.json"),
            duration_ms: 42,
        };

        let summary = renderer().install_summary(&report);
        assert!(summary.starts_with("Installed 1 packages in 42ms\n"));
        assert!(summary.contains("Failed (1):"));
        assert!(summary.contains("acme/broken 1.0.0"));
    }
}
