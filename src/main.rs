use clap::{Parser, Subcommand};
use coco_match::{
    collect_statistics, evaluate, load_from_file, load_from_file_with_options, report,
    save_to_file, threshold, CocoMatchError, EvalParams, IouMethod, LoadOptions, MatchPolicy,
    ScaleRule,
};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Clone, Debug)]
enum Command {
    /// Evaluate one or more prediction datasets with respect to a truth
    /// dataset.
    Eval {
        /// Dataset with "ground truth" annotations
        truth: PathBuf,

        /// Dataset(s) containing predicted instances
        #[clap(required = true)]
        preds: Vec<PathBuf>,

        /// Comma-separated IoU thresholds as integer percents, or "coco" for
        /// 50 to 95 in steps of 5
        #[clap(long, short)]
        thresholds: Option<String>,

        /// Comma-separated metrics to display, or "all"
        #[clap(long, short, default_value = "AP_50,mAP,mF1")]
        values: String,

        /// Overlap measure: box or mask
        #[clap(long)]
        iou_method: Option<IouMethod>,

        /// Match without regard for category
        #[clap(long)]
        class_agnostic: bool,

        /// Rank predictions by matched IoU instead of score for AP
        #[clap(long)]
        sort_by_iou: bool,

        /// Prediction reuse policy: greedy or exclusive
        #[clap(long)]
        match_policy: Option<MatchPolicy>,

        /// Show a progress bar while computing IoU
        #[clap(long)]
        progress: bool,

        /// Report file, ".txt" is appended when missing
        #[clap(long, short)]
        output: Option<PathBuf>,

        /// JSON file with evaluation parameters; flags override it
        #[clap(long, env = "COCO_MATCH_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print coverage, per-class counts and object size statistics.
    Stats {
        /// Dataset(s) to look at
        #[clap(required = true)]
        datasets: Vec<PathBuf>,

        /// Pixel size for matching images, as "<file name regex>:<pixel size
        /// or ratio>"; may be repeated, the first matching rule applies
        #[clap(long, short)]
        scale: Vec<ScaleRule>,

        /// Unit for scaled sizes
        #[clap(long, default_value = "\u{3bc}m")]
        unit: String,
    },
    /// Open a dataset and do nothing. Useful for catching format errors.
    /// Optionally write the normalised dataset back out.
    Unit {
        /// Dataset to check
        dataset: PathBuf,

        /// Where to write the dataset
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
}

#[allow(clippy::too_many_arguments)]
fn handle_eval(
    truth: PathBuf,
    preds: Vec<PathBuf>,
    thresholds: Option<String>,
    values: String,
    iou_method: Option<IouMethod>,
    class_agnostic: bool,
    sort_by_iou: bool,
    match_policy: Option<MatchPolicy>,
    progress: bool,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<(), CocoMatchError> {
    let mut params = match config {
        Some(path) => EvalParams::from_json_file(path)?,
        None => EvalParams::coco(),
    };
    if let Some(thresholds) = thresholds {
        params.iou_thresholds = threshold::parse_thresholds(&thresholds)?;
    }
    if let Some(iou_method) = iou_method {
        params.iou_method = iou_method;
    }
    if let Some(match_policy) = match_policy {
        params.match_policy = match_policy;
    }
    params.class_agnostic |= class_agnostic;
    params.sort_by_iou |= sort_by_iou;
    params.show_progress |= progress;
    params.validate()?;

    let options = LoadOptions {
        rasterize_masks: params.iou_method == IouMethod::Mask,
    };
    let ds_truth = load_from_file_with_options(&truth, options)?;

    let mut results = Vec::with_capacity(preds.len());
    for pred in &preds {
        let ds_preds = load_from_file_with_options(pred, options)?;
        log::info!("evaluating {} against {}", pred.display(), truth.display());
        let metrics = evaluate(&ds_preds, &ds_truth, &params)?;
        results.push((pred.display().to_string(), metrics));
    }

    let truth_name = truth.display().to_string();
    let keys = match results.first() {
        Some((_, metrics)) => report::select_metrics(metrics, &values)?,
        None => Vec::new(),
    };
    print!("{}", report::format_table(&truth_name, &results, &keys));

    if let Some(output) = output {
        let path = report::write_report(output, &truth_name, &results)?;
        println!("Writing report to \"{}\"", path.display());
    }

    Ok(())
}

fn handle_stats(datasets: Vec<PathBuf>, scale: Vec<ScaleRule>, unit: String) -> Result<(), CocoMatchError> {
    let options = LoadOptions {
        rasterize_masks: false,
    };
    for dataset in &datasets {
        let ds = load_from_file_with_options(dataset, options)?;
        let stats = collect_statistics(&ds, &scale);
        print!("{}", report::format_statistics(&dataset.display().to_string(), &stats, &unit));
    }
    Ok(())
}

fn handle_unit(dataset: PathBuf, output: Option<PathBuf>) -> Result<(), CocoMatchError> {
    let ds = load_from_file(&dataset)?;
    println!(
        "{}: {} images, {} instances, {} categories",
        dataset.display(),
        ds.images.len(),
        ds.num_instances(),
        ds.categories.len()
    );

    if let Some(output) = output {
        save_to_file(&ds, output)?;
    }

    Ok(())
}

fn main() -> Result<(), CocoMatchError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.cmd {
        Command::Eval {
            truth,
            preds,
            thresholds,
            values,
            iou_method,
            class_agnostic,
            sort_by_iou,
            match_policy,
            progress,
            output,
            config,
        } => handle_eval(
            truth,
            preds,
            thresholds,
            values,
            iou_method,
            class_agnostic,
            sort_by_iou,
            match_policy,
            progress,
            output,
            config,
        ),
        Command::Stats {
            datasets,
            scale,
            unit,
        } => handle_stats(datasets, scale, unit),
        Command::Unit { dataset, output } => handle_unit(dataset, output),
    }
}
