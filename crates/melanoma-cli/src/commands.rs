use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, info_span};

use melanoma_common::format_numeric;
use melanoma_core::{
    PatientKinetics, Variable, VariableRegistry, VariableSelection, list_selections,
    patient_kinetics,
};
use melanoma_ingest::{DatabaseView, PatientDatabase, RowFilter};
use melanoma_model::{PercentageBase, StatisticsOptions, VariableKind};
use melanoma_report::{
    FormattedTable, NamedStatistics, OutputFormat, StatisticsFormatter, terminal_table, to_csv,
};

use crate::cli::{
    Cli, Command, FilterArgs, FilterOptions, KineticsArgs, OutputFormatArg, PercentageBaseArg, SeriesFormatArg,
    StatsArgs, VariablesArgs,
};
use crate::config::AppConfig;
use crate::filters::build_filters;
use crate::logging::redact_value;
use crate::summary::{info_table, selections_table, variables_table};

const KINETICS_HEADER: [&str; 4] = ["Patient", "Iteration", "Time", "Value"];

/// Loaded database plus its bound variable registry.
pub struct Session {
    pub database: PatientDatabase,
    pub registry: VariableRegistry,
    pub selections: Option<PathBuf>,
}

impl Session {
    /// Load the config at `path`; `data` replaces the configured CSV path.
    pub fn open(path: &Path, data: Option<&Path>) -> Result<Self> {
        let mut config = AppConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?;
        if let Some(data) = data {
            config.database.path = data.to_path_buf();
        }
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let catalog = config.variable_catalog().context("load variable catalog")?;
        let database = PatientDatabase::open(config.database.clone()).with_context(|| {
            format!("open patient database {}", config.database.path.display())
        })?;
        let registry = VariableRegistry::from_catalog(catalog).context("build variables")?;
        Self::bind(database, registry, config.selections)
    }

    /// Bind `registry` to the current snapshot of `database`.
    pub fn bind(
        database: PatientDatabase,
        mut registry: VariableRegistry,
        selections: Option<PathBuf>,
    ) -> Result<Self> {
        let dataset = database.snapshot();
        registry
            .init_from_dataframe(&dataset)
            .context("bind variables to the patient database")?;
        Ok(Self {
            database,
            registry,
            selections,
        })
    }

    fn filtered(&self, options: &FilterOptions) -> Result<DatabaseView> {
        let filters = build_filters(&self.registry, options)?;
        let refs: Vec<&dyn RowFilter> = filters.iter().map(|filter| filter.as_ref()).collect();
        let view = self.database.filter(&refs).context("filter patients")?;
        if !refs.is_empty() {
            info!(
                filters = refs.len(),
                kept = view.height(),
                total = self.database.snapshot().height(),
                "Applied patient filters"
            );
        }
        Ok(view)
    }

    /// `path` as given, else looked up in the selections directory.
    fn selection_path(&self, path: &Path) -> PathBuf {
        match &self.selections {
            Some(dir) if !path.exists() && path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Open the configured session and run the parsed command.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let session = Session::open(&cli.config, cli.data.as_deref())?;
    match &cli.command {
        Command::Info => run_info(&session, out),
        Command::Variables(args) => run_variables(&session, args, out),
        Command::Stats(args) => run_stats(&session, args, out),
        Command::Kinetics(args) => run_kinetics(&session, args, out),
        Command::Filter(args) => run_filter(&session, args, out),
        Command::Selections => run_selections(&session, out),
    }
}

pub fn run_info(session: &Session, out: &mut dyn Write) -> Result<()> {
    let info = session.database.file_info();
    let dataset = session.database.snapshot();
    writeln!(out, "{}", info_table(&info, &dataset))?;
    Ok(())
}

pub fn run_variables(session: &Session, args: &VariablesArgs, out: &mut dyn Write) -> Result<()> {
    let kinds = args
        .kinds
        .iter()
        .map(|kind| VariableKind::from_str(kind).map_err(|message| anyhow!(message)))
        .collect::<Result<Vec<_>>>()?;
    let registry = &session.registry;
    let variables: Vec<&Variable> = match (kinds.is_empty(), args.selectable) {
        (true, false) => registry.iter().collect(),
        (true, true) => registry.selectable(),
        (false, false) => registry.by_kinds(&kinds),
        (false, true) => registry.selectable_by_kinds(&kinds),
    };
    writeln!(out, "{}", variables_table(variables))?;
    Ok(())
}

pub fn run_stats(session: &Session, args: &StatsArgs, out: &mut dyn Write) -> Result<()> {
    let registry = &session.registry;
    let ids = match &args.selection {
        Some(path) => {
            let path = session.selection_path(path);
            VariableSelection::load(&path)
                .with_context(|| format!("load selection {}", path.display()))?
                .variable_ids
        }
        None if args.variables.is_empty() => registry
            .selectable()
            .into_iter()
            .map(|variable| variable.id().to_string())
            .collect(),
        None => args.variables.clone(),
    };
    if ids.is_empty() {
        bail!("no variables to describe");
    }
    let variables = ids
        .iter()
        .map(|id| registry.get(id))
        .collect::<Result<Vec<_>, _>>()?;
    let group_by = args
        .group_by
        .iter()
        .map(|id| registry.get(id))
        .collect::<Result<Vec<_>, _>>()?;

    let view = session.filtered(&args.filters)?;
    let dataset = view.dataset();
    let span = info_span!("stats", variables = variables.len(), rows = dataset.height());
    let _guard = span.enter();

    let options = StatisticsOptions::default()
        .with_percentage_base(match args.percentages {
            PercentageBaseArg::NonMissing => PercentageBase::NonMissing,
            PercentageBaseArg::Total => PercentageBase::Total,
        })
        .with_span(args.span);
    let tables = variables
        .iter()
        .map(|variable| {
            variable
                .descriptive_statistics(dataset, &group_by, options)
                .with_context(|| format!("describe {}", variable.id()))
        })
        .collect::<Result<Vec<_>>>()?;
    let entries: Vec<NamedStatistics<'_>> = variables
        .iter()
        .zip(&tables)
        .map(|(variable, table)| NamedStatistics::new(variable.display_name(), table))
        .collect();
    let formatted = StatisticsFormatter::default().format_all(&entries);
    let format = match args.format {
        OutputFormatArg::Table => OutputFormat::Table,
        OutputFormatArg::Csv => OutputFormat::Csv,
        OutputFormatArg::Markdown => OutputFormat::Markdown,
    };
    let rendered = format.render(&formatted).context("render statistics")?;
    writeln!(out, "{}", rendered.trim_end())?;

    if let Some(path) = &args.save_selection {
        let name = path
            .file_stem()
            .map_or_else(|| "selection".to_string(), |stem| stem.to_string_lossy().into_owned());
        VariableSelection::from_variables(name, variables.iter().copied())
            .save(path)
            .with_context(|| format!("save selection {}", path.display()))?;
        info!(path = %path.display(), "Saved variable selection");
    }
    Ok(())
}

pub fn run_kinetics(session: &Session, args: &KineticsArgs, out: &mut dyn Write) -> Result<()> {
    let time = session.registry.get(&args.time)?;
    let value = session.registry.get(&args.value)?;
    let view = session.filtered(&args.filters)?;
    let patients = (!args.patients.is_empty()).then_some(args.patients.as_slice());
    let series = patient_kinetics(view.dataset(), time, value, patients)
        .with_context(|| format!("kinetics of {} over {}", value.id(), time.id()))?;
    for patient in &series {
        debug!(
            patient = redact_value(&patient.patient_id),
            points = patient.points.len(),
            "Kinetics series"
        );
    }

    let rendered = match args.format {
        SeriesFormatArg::Json => serde_json::to_string_pretty(&series)?,
        SeriesFormatArg::Csv => to_csv(&kinetics_table(&series)).context("render kinetics")?,
        SeriesFormatArg::Table => terminal_table(&kinetics_table(&series)).to_string(),
    };
    writeln!(out, "{}", rendered.trim_end())?;
    Ok(())
}

/// One row per point; patients without points get a single empty row.
pub fn kinetics_table(series: &[PatientKinetics]) -> FormattedTable {
    let mut rows = Vec::new();
    for patient in series {
        if patient.points.is_empty() {
            rows.push(vec![
                patient.patient_id.clone(),
                String::new(),
                String::new(),
                String::new(),
            ]);
        }
        for point in &patient.points {
            rows.push(vec![
                patient.patient_id.clone(),
                point.index.to_string(),
                format_numeric(point.time),
                format_numeric(point.value),
            ]);
        }
    }
    FormattedTable {
        header: KINETICS_HEADER.iter().map(|label| label.to_string()).collect(),
        rows,
    }
}

pub fn run_filter(session: &Session, args: &FilterArgs, out: &mut dyn Write) -> Result<()> {
    let total = session.database.snapshot().height();
    let view = session.filtered(&args.filters)?;
    writeln!(out, "{} of {} patients", view.height(), total)?;
    if args.list {
        for id in view.patient_ids() {
            debug!(patient = redact_value(&id), "Kept patient");
            writeln!(out, "{id}")?;
        }
    }
    if let Some(path) = &args.output {
        let dataset = view.dataset();
        let columns = export_columns(&session.registry, dataset.patient_id_column(), &args.columns)?;
        let rows = dataset
            .write_csv(path, &columns)
            .with_context(|| format!("export patients to {}", path.display()))?;
        info!(path = %path.display(), rows, columns = columns.len(), "Exported filtered patients");
    }
    Ok(())
}

/// Dataset columns of the `ids` variables, patient id first. Empty when no
/// variable is requested, which exports every column.
fn export_columns<'r>(
    registry: &'r VariableRegistry,
    patient_id: Option<&'r str>,
    ids: &[String],
) -> Result<Vec<&'r str>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut columns: Vec<&str> = patient_id.into_iter().collect();
    for id in ids {
        for column in registry.get(id)?.columns() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    Ok(columns)
}

pub fn run_selections(session: &Session, out: &mut dyn Write) -> Result<()> {
    let Some(dir) = &session.selections else {
        bail!("no selections directory configured");
    };
    let selections = list_selections(dir)
        .with_context(|| format!("list selections in {}", dir.display()))?
        .iter()
        .map(|path| {
            VariableSelection::load(path)
                .with_context(|| format!("load selection {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    writeln!(out, "{}", selections_table(&selections))?;
    Ok(())
}
