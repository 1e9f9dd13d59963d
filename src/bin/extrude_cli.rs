#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("extrude_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use spline_extrude::geom::{
        ContinuityMode, Curve, CurveError, EndingStyle, ExtrudeDiagnostics, ExtrudeOptions,
        IntersectionAvoidance, MeshBuildResult, Point3, ProfileShape, Vec2Provider,
        extrude_curve, load_curve_json, load_options_json, load_profile_json,
    };
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"extrude_cli (spline-extrude)

USAGE:
  extrude_cli list
  extrude_cli run <scenario> [--obj <path>] [--overwrite]
  extrude_cli extrude --curve <json> [--profile <json>] [--options <json>] [--obj <path>] [--overwrite]

SCENARIOS:
  straight_tube
  closed_ring
  capped_s_bend
  folded_ribbon

OPTIONS:
  --obj <path>       Write the mesh as OBJ
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                for scenario in Scenario::ALL {
                    println!("{}", scenario.name());
                }
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "extrude" => cmd_extrude(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    struct Output {
        obj_path: Option<PathBuf>,
        overwrite: bool,
    }

    /// Parses the shared trailing options; `extra` handles command-specific
    /// flags and returns `false` for unknown ones.
    fn parse_output(
        args: &mut Args,
        mut extra: impl FnMut(&str, &mut Args) -> Result<bool, String>,
    ) -> Result<Option<Output>, String> {
        let mut output = Output {
            obj_path: None,
            overwrite: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--obj" => output.obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--overwrite" => output.overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(None);
                }
                other => {
                    if !extra(other, args)? {
                        return Err(format!("unknown option `{other}`\n\n{USAGE}"));
                    }
                }
            }
        }
        Ok(Some(output))
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let name = args.next().ok_or("missing scenario name")?;
        let scenario = Scenario::from_str(&name)
            .ok_or_else(|| format!("unknown scenario `{name}` (try `extrude_cli list`)"))?;
        let Some(output) = parse_output(args, |_, _| Ok(false))? else {
            return Ok(());
        };

        let (curve, profile, options) = scenario.build()?;
        extrude_and_report(scenario.name(), &curve, &profile, &options, &output)
    }

    fn cmd_extrude(args: &mut Args) -> Result<(), String> {
        let mut curve_path: Option<PathBuf> = None;
        let mut profile_path: Option<PathBuf> = None;
        let mut options_path: Option<PathBuf> = None;

        let Some(output) = parse_output(args, |flag, args| {
            match flag {
                "--curve" => curve_path = Some(PathBuf::from(args.value(flag)?)),
                "--profile" => profile_path = Some(PathBuf::from(args.value(flag)?)),
                "--options" => options_path = Some(PathBuf::from(args.value(flag)?)),
                _ => return Ok(false),
            }
            Ok(true)
        })?
        else {
            return Ok(());
        };

        let curve_path = curve_path.ok_or("missing --curve")?;
        let curve = load_curve_json(&curve_path)
            .map_err(|e| format!("load {}: {e}", curve_path.display()))?;
        let profile = match profile_path {
            Some(path) => load_profile_json(&path).map_err(|e| format!("load {}: {e}", path.display()))?,
            None => default_profile()?,
        };
        let options = match options_path {
            Some(path) => load_options_json(&path).map_err(|e| format!("load {}: {e}", path.display()))?,
            None => ExtrudeOptions::default(),
        };

        let name = curve_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("curve")
            .to_string();
        extrude_and_report(&name, &curve, &profile, &options, &output)
    }

    fn extrude_and_report(
        name: &str,
        curve: &Curve,
        profile: &ProfileShape,
        options: &ExtrudeOptions,
        output: &Output,
    ) -> Result<(), String> {
        let (mesh, diagnostics) =
            extrude_curve(curve, profile, options).map_err(|e| format!("extrude {name}: {e}"))?;

        if let Some(path) = output.obj_path.as_deref() {
            write_obj_file(path, &mesh, name, output.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(name, curve, &mesh, &diagnostics);
        Ok(())
    }

    fn report(name: &str, curve: &Curve, mesh: &MeshBuildResult, diagnostics: &ExtrudeDiagnostics) {
        eprintln!(
            "{name}: length={:.4} vertices={} triangles={} | {}",
            curve.length(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            diagnostics.summary()
        );
        print!("{diagnostics}");
    }

    fn default_profile() -> Result<ProfileShape, String> {
        ProfileShape::circle(12, 0.25).map_err(|e| format!("default profile: {e}"))
    }

    #[derive(Debug, Clone, Copy)]
    enum Scenario {
        StraightTube,
        ClosedRing,
        CappedSBend,
        FoldedRibbon,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::StraightTube,
            Scenario::ClosedRing,
            Scenario::CappedSBend,
            Scenario::FoldedRibbon,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::StraightTube => "straight_tube",
                Scenario::ClosedRing => "closed_ring",
                Scenario::CappedSBend => "capped_s_bend",
                Scenario::FoldedRibbon => "folded_ribbon",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|s| s.name() == name)
        }

        fn build(self) -> Result<(Curve, ProfileShape, ExtrudeOptions), String> {
            let curve_err = |e: CurveError| format!("{}: {e}", self.name());
            match self {
                Scenario::StraightTube => {
                    let curve = Curve::through_points(
                        &[Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 10.0)],
                        false,
                    )
                    .map_err(curve_err)?;
                    Ok((curve, default_profile()?, ExtrudeOptions::default()))
                }
                Scenario::ClosedRing => {
                    let corners = [
                        Point3::new(0.0, 0.0, 0.0),
                        Point3::new(4.0, 0.0, 0.0),
                        Point3::new(4.0, 0.0, 4.0),
                        Point3::new(0.0, 0.0, 4.0),
                        Point3::new(0.0, 0.0, 0.0),
                    ];
                    let mut curve = Curve::through_points(&corners, true).map_err(curve_err)?;
                    for i in 0..curve.control_point_count() {
                        curve
                            .set_control_point_mode(i, ContinuityMode::Mirrored)
                            .map_err(curve_err)?;
                    }
                    let options = ExtrudeOptions {
                        scale: Vec2Provider::RandomBetweenScalars {
                            min: 0.8,
                            max: 1.2,
                            seed: 7,
                        },
                        ..ExtrudeOptions::default()
                    };
                    Ok((curve, default_profile()?, options))
                }
                Scenario::CappedSBend => {
                    let mut curve = Curve::through_points(
                        &[
                            Point3::new(0.0, 0.0, 0.0),
                            Point3::new(2.0, 0.0, 3.0),
                            Point3::new(0.0, 0.0, 6.0),
                        ],
                        false,
                    )
                    .map_err(curve_err)?;
                    curve
                        .set_control_point_mode(1, ContinuityMode::Aligned)
                        .map_err(curve_err)?;
                    let options = ExtrudeOptions {
                        ending_style: EndingStyle::Rounded,
                        ..ExtrudeOptions::default()
                    };
                    Ok((curve, default_profile()?, options))
                }
                Scenario::FoldedRibbon => {
                    let curve = Curve::through_points(
                        &[
                            Point3::new(0.0, 0.0, 0.0),
                            Point3::new(0.0, 0.0, 2.0),
                            Point3::new(0.3, 0.0, 0.5),
                        ],
                        false,
                    )
                    .map_err(curve_err)?;
                    let profile =
                        ProfileShape::ribbon(1.0).map_err(|e| format!("{}: {e}", self.name()))?;
                    let options = ExtrudeOptions {
                        intersection_avoidance: IntersectionAvoidance::Both,
                        show_overlap: true,
                        ..ExtrudeOptions::default()
                    };
                    Ok((curve, profile, options))
                }
            }
        }
    }

    fn write_obj_file(path: &Path, mesh: &MeshBuildResult, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# spline-extrude extrude_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in &mesh.positions {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }
        for uv in &mesh.uvs {
            writeln!(w, "vt {} {}", uv[0], uv[1]).map_err(|e| format!("write obj: {e}"))?;
        }
        for n in &mesh.normals {
            writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + 1;
            let b = tri[1] + 1;
            let c = tri[2] + 1;
            writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}").map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
