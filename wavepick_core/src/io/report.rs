//! Writes the chosen wave of an instance as a text report, and optionally as JSON
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::io::IoError;
use crate::wave::solution::Wave;

/// Name of the report written for an instance file, `<stem>_out.txt`
pub fn report_file_name(instance_path: &Path) -> String {
    format!("{}_out.txt", file_stem(instance_path))
}

/// Name of the JSON report written for an instance file, `<stem>_out.json`
pub fn json_report_file_name(instance_path: &Path) -> String {
    format!("{}_out.json", file_stem(instance_path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string())
}

/// Render the text report of a wave
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use wavepick_core::io::report::render_report;
/// use wavepick_core::wave::instance::{Aisle, InstanceBuilder, Order};
/// use wavepick_core::wave::solution::Wave;
/// let instance = InstanceBuilder::default()
///     .orders(vec![Order::new(0, IndexMap::from([(0, 3)]))])
///     .aisles(vec![Aisle::new(0, IndexMap::from([(0, 3)]))])
///     .upper_bound(5)
///     .build()
///     .unwrap();
/// let wave = Wave::from_selection(&instance, vec![0], vec![0], 1);
/// assert!(render_report(&wave).starts_with("Valor da função objetivo (total de itens): 3\n"));
/// ```
pub fn render_report(wave: &Wave) -> String {
    TextReport(wave).to_string()
}

/// Text report of a wave, one id per line after each heading
pub struct TextReport<'a>(pub &'a Wave);

impl Display for TextReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let wave = self.0;
        writeln!(f, "Valor da função objetivo (total de itens): {}", wave.objective())?;
        writeln!(f, "Número de corredores selecionados: {}", wave.aisle_count())?;
        writeln!(f, "Relação (itens por corredor): {:.2}", wave.ratio())?;
        writeln!(f, "Número de pedidos na wave: {}", wave.orders().len())?;
        writeln!(f, "Pedidos escolhidos:")?;
        for order in wave.orders() {
            writeln!(f, "{order}")?;
        }
        writeln!(f, "Número de corredores na solução: {}", wave.aisles().len())?;
        writeln!(f, "Corredores escolhidos:")?;
        for aisle in wave.aisles() {
            writeln!(f, "{aisle}")?;
        }
        Ok(())
    }
}

/// Write the text report of a wave to a file
pub fn write_report(path: &Path, wave: &Wave) -> Result<(), IoError> {
    fs::write(path, render_report(wave)).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("report written to {:?}", path);
    Ok(())
}

/// JSON form of the report of one instance
#[derive(Debug, Clone, Serialize)]
pub struct WaveReport<'a> {
    /// File name of the instance
    pub instance: String,
    /// Units collected
    pub objective: u64,
    /// Aisles visited
    pub aisle_count: usize,
    /// Units collected per aisle visited
    pub ratio: f64,
    /// Ids of the selected orders
    pub orders: &'a [usize],
    /// Ids of the selected aisles
    pub aisles: &'a [usize],
}

impl<'a> WaveReport<'a> {
    pub fn new(instance: &str, wave: &'a Wave) -> Self {
        WaveReport {
            instance: instance.to_string(),
            objective: wave.objective(),
            aisle_count: wave.aisle_count(),
            ratio: wave.ratio(),
            orders: wave.orders(),
            aisles: wave.aisles(),
        }
    }
}

/// Write the JSON report of a wave to a file
pub fn write_json_report(path: &Path, report: &WaveReport) -> Result<(), IoError> {
    let file = File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|source| IoError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("json report written to {:?}", path);
    Ok(())
}

/// Paths of the text and JSON reports for an instance inside an output directory
pub fn report_paths(output_dir: &Path, instance_path: &Path) -> (PathBuf, PathBuf) {
    (
        output_dir.join(report_file_name(instance_path)),
        output_dir.join(json_report_file_name(instance_path)),
    )
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::wave::instance::{Aisle, Instance, InstanceBuilder, Order};

    fn instance() -> Instance {
        InstanceBuilder::default()
            .orders(vec![
                Order::new(0, IndexMap::from([(0, 3)])),
                Order::new(1, IndexMap::from([(0, 2)])),
                Order::new(2, IndexMap::from([(1, 2)])),
            ])
            .aisles(vec![
                Aisle::new(0, IndexMap::from([(0, 3)])),
                Aisle::new(1, IndexMap::from([(0, 2), (1, 2)])),
                Aisle::new(2, IndexMap::from([(1, 1)])),
            ])
            .upper_bound(10)
            .build()
            .unwrap()
    }

    #[test]
    fn render() {
        let instance = instance();
        let wave = Wave::from_selection(&instance, vec![2, 0, 1], vec![1, 0], 2);
        let expected = "\
Valor da função objetivo (total de itens): 7
Número de corredores selecionados: 2
Relação (itens por corredor): 3.50
Número de pedidos na wave: 3
Pedidos escolhidos:
0
1
2
Número de corredores na solução: 2
Corredores escolhidos:
0
1
";
        assert_eq!(render_report(&wave), expected);
    }

    #[test]
    fn ratio_is_rounded_to_two_decimals() {
        let instance = instance();
        // 7 units over 3 aisles
        let wave = Wave::from_selection(&instance, vec![0, 1, 2], vec![0, 1, 2], 3);
        assert!(render_report(&wave).contains("Relação (itens por corredor): 2.33\n"));
        // 5 units over 3 aisles
        let wave = Wave::from_selection(&instance, vec![0, 1], vec![0, 1, 2], 3);
        assert!(render_report(&wave).contains("Relação (itens por corredor): 1.67\n"));
    }

    #[test]
    fn text_report_display() {
        let instance = instance();
        let wave = Wave::from_selection(&instance, vec![], vec![2], 1);
        assert_eq!(
            format!("{}", TextReport(&wave)),
            "\
Valor da função objetivo (total de itens): 0
Número de corredores selecionados: 1
Relação (itens por corredor): 0.00
Número de pedidos na wave: 0
Pedidos escolhidos:
Número de corredores na solução: 1
Corredores escolhidos:
2
"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn json_flush_errors_are_reported() {
        let instance = instance();
        let wave = Wave::from_selection(&instance, vec![0], vec![0], 1);
        // Writes to /dev/full fail with "no space left on device" once flushed
        let res = write_json_report(Path::new("/dev/full"), &WaveReport::new("a.txt", &wave));
        assert!(matches!(res, Err(IoError::Write { .. })));
    }

    #[test]
    fn file_names() {
        assert_eq!(
            report_file_name(Path::new("instances/instance_0001.txt")),
            "instance_0001_out.txt"
        );
        assert_eq!(
            json_report_file_name(Path::new("instance_0001.txt")),
            "instance_0001_out.json"
        );
        let (text, json) = report_paths(Path::new("out"), Path::new("in/a.b.txt"));
        assert_eq!(text, Path::new("out/a.b_out.txt"));
        assert_eq!(json, Path::new("out/a.b_out.json"));
    }

    #[test]
    fn write_reports() {
        let instance = instance();
        let wave = Wave::from_selection(&instance, vec![0], vec![0], 1);
        let dir = tempfile::tempdir().unwrap();
        let (text_path, json_path) = report_paths(dir.path(), Path::new("instance_0001.txt"));

        write_report(&text_path, &wave).unwrap();
        assert_eq!(fs::read_to_string(&text_path).unwrap(), render_report(&wave));

        write_json_report(&json_path, &WaveReport::new("instance_0001.txt", &wave)).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["objective"], 3);
        assert_eq!(json["aisle_count"], 1);
        assert_eq!(json["orders"], serde_json::json!([0]));
        assert_eq!(json["instance"], "instance_0001.txt");
    }
}
