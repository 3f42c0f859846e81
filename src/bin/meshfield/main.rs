//! meshfield CLI - scalar field composition on meshes.
//!
//! Usage: meshfield <COMMAND> [OPTIONS] <INPUT>
//!
//! Run `meshfield --help` for available commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::{Point3, Vector3};

use meshfield::algo::overlap::{OverlapMethod, OverlapScalarFields};
use meshfield::algo::scale::{ScaleGeometry, ScaleOptions};
use meshfield::algo::switch::{SwitchOptions, SwitchScalarField, DEFAULT_TOLERANCE};
use meshfield::field::ScalarField;
use meshfield::io;
use meshfield::mesh::Geometry;

#[derive(Parser)]
#[command(name = "meshfield")]
#[command(author, version, about = "Scalar field composition CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display geometry information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Reduce several fields on one mesh into a single field
    Overlap {
        /// Input mesh file
        input: PathBuf,

        /// Field file (one value per line); repeat for each field
        #[arg(short, long = "field", required = true)]
        fields: Vec<PathBuf>,

        /// Reduction applied at each vertex
        #[arg(short, long, value_enum, default_value = "sum")]
        method: Method,

        /// Output field file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve the field of a target mesh from fields on source meshes
    Switch {
        /// Target mesh file
        target: PathBuf,

        /// Source mesh file; paired by position with --field
        #[arg(short, long = "source", required = true)]
        sources: Vec<PathBuf>,

        /// Field file on the matching source mesh
        #[arg(short, long = "field", required = true)]
        fields: Vec<PathBuf>,

        /// Only accept a field defined on the target mesh itself
        #[arg(long)]
        no_mapping: bool,

        /// Bounding box tolerance for spatial correspondence
        #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,

        /// Output field file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute scaling displacements of a mesh
    Scale {
        /// Input mesh file
        input: PathBuf,

        /// Scaling factor per axis
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true, required = true)]
        factor: Vec<f64>,

        /// Fixed point of the scaling (default: world origin)
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true, conflicts_with = "mean_point")]
        origin: Option<Vec<f64>>,

        /// Scale about the vertex centroid
        #[arg(long)]
        mean_point: bool,

        /// Per-vertex weight field file
        #[arg(long)]
        filter: Option<PathBuf>,

        /// Output file for the displacement magnitudes
        #[arg(short, long)]
        output: PathBuf,

        /// Also save the scaled mesh
        #[arg(long)]
        mesh_out: Option<PathBuf>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Largest value
    Max,
    /// Smallest value
    Min,
    /// Arithmetic mean
    Average,
    /// Sum of all values
    Sum,
}

impl From<Method> for OverlapMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Max => OverlapMethod::Max,
            Method::Min => OverlapMethod::Min,
            Method::Average => OverlapMethod::Average,
            Method::Sum => OverlapMethod::Sum,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Overlap {
            input,
            fields,
            method,
            output,
        } => {
            cmd_overlap(&input, &fields, method.into(), output.as_deref())?;
        }

        Commands::Switch {
            target,
            sources,
            fields,
            no_mapping,
            tolerance,
            output,
        } => {
            let options = SwitchOptions::default()
                .with_mapping(!no_mapping)
                .with_tolerance(tolerance);
            options.validate()?;
            cmd_switch(&target, &sources, &fields, options, output.as_deref())?;
        }

        Commands::Scale {
            input,
            factor,
            origin,
            mean_point,
            filter,
            output,
            mesh_out,
            sequential,
        } => {
            let mut options = ScaleOptions::default()
                .with_scaling(Vector3::new(factor[0], factor[1], factor[2]))
                .with_mean_point(mean_point)
                .with_parallel(!sequential);
            if let Some(o) = origin {
                options = options.with_origin(Point3::new(o[0], o[1], o[2]));
            }
            cmd_scale(&input, options, filter.as_deref(), &output, mesh_out.as_deref())?;
        }
    }

    Ok(())
}

fn emit(field: &ScalarField, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            io::field::write(field, path)?;
            println!("Saved: {} ({} values)", path.display(), field.len());
        }
        None => {
            for (id, value) in field.iter() {
                println!("{} {}", id.index(), value);
            }
        }
    }
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let geo: Geometry = io::load(input)?;

    println!("File: {}", input.display());
    println!("Kind: {:?}", geo.kind());
    println!("Vertices: {}", geo.num_vertices());
    println!("Cells: {}", geo.num_cells());

    if let Some(bounds) = geo.bounding_box() {
        let (min, max) = (bounds.min, bounds.max);
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    let start = Instant::now();
    let tree = geo.bv_tree();
    println!(
        "BV tree: {} nodes, depth {} ({:.2?})",
        tree.num_nodes(),
        tree.depth(),
        start.elapsed()
    );

    Ok(())
}

fn cmd_overlap(
    input: &Path,
    field_paths: &[PathBuf],
    method: OverlapMethod,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let geo: Geometry = io::load(input)?;
    let mut fields = field_paths
        .iter()
        .map(|path| io::field::read(path, &geo))
        .collect::<Result<Vec<_>, _>>()?;

    eprintln!(
        "Loaded: {} vertices, {} fields ({:?})",
        geo.num_vertices(),
        fields.len(),
        method
    );

    let mut overlap = OverlapScalarFields::new();
    overlap.set_method(method);
    let accepted = overlap.add_fields(fields.iter_mut().map(|f| (&geo, f)));
    if accepted < field_paths.len() {
        eprintln!("Skipped {} empty fields", field_paths.len() - accepted);
    }
    overlap.execute();

    let result = overlap
        .result(geo.id())
        .ok_or("no field could be registered on the mesh")?;
    emit(result, output)
}

fn cmd_switch(
    target_path: &Path,
    source_paths: &[PathBuf],
    field_paths: &[PathBuf],
    options: SwitchOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if source_paths.len() != field_paths.len() {
        return Err(format!(
            "{} sources but {} fields; pass one --field per --source",
            source_paths.len(),
            field_paths.len()
        )
        .into());
    }

    // A source path equal to the target path designates the target itself.
    let target: Geometry = io::load(target_path)?;
    let mut sources: Vec<Option<Geometry>> = Vec::with_capacity(source_paths.len());
    for path in source_paths {
        if path == target_path {
            sources.push(None);
        } else {
            sources.push(Some(io::load(path)?));
        }
    }

    let mut fields = Vec::with_capacity(field_paths.len());
    for (path, source) in field_paths.iter().zip(&sources) {
        let geo = source.as_ref().unwrap_or(&target);
        fields.push(io::field::read(path, geo)?);
    }

    let mut switch = SwitchScalarField::new().with_options(options);
    switch.set_target(&target);
    for (field, source) in fields.iter().zip(&sources) {
        switch.add_field(field, source.as_ref().unwrap_or(&target));
    }

    let start = Instant::now();
    switch.switch()?;
    eprintln!(
        "Resolved {} of {} target vertices ({:.2?})",
        switch.switched_field().len(),
        target.num_vertices(),
        start.elapsed()
    );

    emit(switch.switched_field(), output)
}

fn cmd_scale(
    input: &Path,
    options: ScaleOptions,
    filter: Option<&Path>,
    output: &Path,
    mesh_out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut geo: Geometry = io::load(input)?;

    let mut scale = ScaleGeometry::with_options(options);
    if let Some(path) = filter {
        scale.set_filter(Some(io::field::read(path, &geo)?));
    }

    let start = Instant::now();
    scale.execute(&geo);
    let elapsed = start.elapsed();

    emit(&scale.displacement_magnitudes(), Some(output))?;

    if let Some(path) = mesh_out {
        scale.apply(&mut geo);
        io::save(&geo, path)?;
        println!("Saved: {} ({:.2?})", path.display(), elapsed);
    }

    Ok(())
}
