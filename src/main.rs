use std::fs::File;
use std::io::Write;
use std::time::Instant;

use clap::{arg, crate_version, ArgAction, Command};
use log::{info, warn};

use lz78_codec::{decoder, encoder, Error, Options, DEC_ORIG_FILENAME, STD_OPTIONS};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let long_help = "\
Examples:
---------
Compress:  `lz78 compress -i hamlet.txt -o hamlet.lz78 -m`
Expand:    `lz78 expand -i hamlet.lz78 -o hamlet.txt -f`
Stdin/out: `lz78 compress -i - -o - < hamlet.txt > hamlet.lz78`";

    let mut main_cmd = Command::new("lz78")
        .about("Compress and expand files with the LZ78 dictionary codec")
        .after_long_help(long_help)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(
        Command::new("compress")
            .about("compress a file")
            .arg(arg!(-i --input <PATH> "input path; omit or pass - for stdin").required(false))
            .arg(arg!(-o --output <PATH> "output path; omit or pass - for stdout (default: <input>.lz78 when -n is set)").required(false))
            .arg(arg!(-s --size <N> "dictionary size").value_parser(clap::value_parser!(u32)))
            .arg(arg!(-t --table <N> "hash table size").value_parser(clap::value_parser!(u32)))
            .arg(arg!(-m --md5 "record an MD5 digest of the input").action(ArgAction::SetTrue))
            .arg(arg!(-n --name "record the input's basename").action(ArgAction::SetTrue))
            .arg(arg!(-k --timestamp "record the input's modification time").action(ArgAction::SetTrue))
            .arg(arg!(-v --verbose "increase verbosity").action(ArgAction::Count)),
    );

    main_cmd = main_cmd.subcommand(
        Command::new("expand")
            .about("expand a file")
            .arg(arg!(-i --input <PATH> "input path; omit or pass - for stdin").required(false))
            .arg(arg!(-o --output <PATH> "output path; omit or pass - for stdout").required(false))
            .arg(arg!(-f --filename "restore the original filename recorded at compression time, used when -o is omitted")
                .action(ArgAction::SetTrue))
            .arg(arg!(-v --verbose "increase verbosity").action(ArgAction::Count)),
    );

    let matches = main_cmd.get_matches();

    let verbosity = matches
        .subcommand()
        .map(|(_, m)| m.get_count("verbose"))
        .unwrap_or(0);
    env_logger::Builder::new()
        .filter_level(match verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .parse_default_env()
        .init();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        return run_compress(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("expand") {
        return run_expand(cmd);
    }
    Ok(())
}

/// `-i`/`-o` values, with `-`/absence meaning the ambient standard stream.
fn path_arg<'a>(cmd: &'a clap::ArgMatches, id: &str) -> Option<&'a str> {
    cmd.get_one::<String>(id).map(String::as_str).filter(|s| *s != "-")
}

fn run_compress(cmd: &clap::ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path_in = path_arg(cmd, "input");
    let want_name = cmd.get_flag("name");

    let mut opt = STD_OPTIONS;
    if let Some(&size) = cmd.get_one::<u32>("size") {
        opt.dict_size = size;
        opt.ht_size = opt.ht_size.max(size);
    }
    if let Some(&table) = cmd.get_one::<u32>("table") {
        opt.ht_size = table;
    }
    if want_name {
        if let Some(p) = path_in {
            opt.name = basename(p);
        }
    }
    if cmd.get_flag("timestamp") {
        if let Some(p) = path_in {
            opt.mtime = mtime_of(p);
        }
    }
    opt.compute_digest = cmd.get_flag("md5");

    let explicit_out = cmd.get_one::<String>("output").cloned();
    let path_out = match &explicit_out {
        Some(p) if p != "-" => Some(p.clone()),
        Some(_) => None, // explicit "-"
        None => match (path_in, want_name) {
            (Some(p), true) => basename(p).map(|n| format!("{}.lz78", n)),
            _ => None,
        },
    };
    if let (Some(i), Some(o)) = (path_in, &path_out) {
        if i == o.as_str() {
            return Err(Box::new(Error::InvalidArgument {
                detail: "input and output paths must differ".into(),
            }));
        }
    }

    let start = Instant::now();
    // A file is always seekable, so the digest-capable pipeline is used
    // unconditionally for file input (it simply does nothing extra when
    // `-m` is absent). Standard input cannot be rewound, so it always takes
    // the plain streaming pipeline, which skips `-m` rather than buffering
    // the whole stream just to make it seekable.
    let outcome = match path_in {
        Some(p) => {
            let mut src = File::open(p)?;
            match &path_out {
                Some(o) => {
                    let mut out = File::create(o)?;
                    encoder::compress_seekable(&mut src, &mut out, &opt)?
                }
                None => encoder::compress_seekable_to_stdout(&mut src, &opt)?,
            }
        }
        None => {
            if opt.compute_digest {
                warn!("stdin is not seekable; skipping integrity digest");
            }
            let stdin = std::io::stdin();
            let mut src = stdin.lock();
            match &path_out {
                Some(o) => {
                    let mut out = File::create(o)?;
                    encoder::compress(&mut src, &mut out, &opt)?
                }
                None => encoder::compress_to_stdout(&mut src, &opt)?,
            }
        }
    };

    info!(
        "compressed {} bytes into {} bytes in {:.2}s ({:.2} MB/s)",
        outcome.bytes_read,
        outcome.bytes_written,
        start.elapsed().as_secs_f64(),
        throughput_mb_s(outcome.bytes_read, start.elapsed())
    );
    Ok(())
}

fn run_expand(cmd: &clap::ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path_in = path_arg(cmd, "input");
    let explicit_out = cmd.get_one::<String>("output").cloned();
    let restore_flags = if cmd.get_flag("filename") { DEC_ORIG_FILENAME } else { 0 };

    if let (Some(i), Some(o)) = (path_in, &explicit_out) {
        if i == o.as_str() && o != "-" {
            return Err(Box::new(Error::InvalidArgument {
                detail: "input and output paths must differ".into(),
            }));
        }
    }

    let start = Instant::now();

    // `expand` buffers the decoded bytes in memory: when -o is omitted and
    // -f is set, the output path isn't known until the META_NAME record has
    // been read, which only happens partway through decoding.
    let mut decoded = Vec::new();
    let outcome = match path_in {
        Some(p) => {
            let mut src = File::open(p)?;
            decoder::expand(&mut src, &mut decoded)?
        }
        None => decoder::expand_from_stdin(&mut decoded)?,
    };

    let resolved_out = match &explicit_out {
        Some(p) if p != "-" => Some(p.clone()),
        Some(_) => None,
        None if restore_flags & DEC_ORIG_FILENAME != 0 => outcome.name.clone(),
        None => None,
    };

    match &resolved_out {
        None => std::io::stdout().write_all(&decoded)?,
        Some(p) => {
            std::fs::write(p, &decoded)?;
            if let Some(mtime) = outcome.mtime {
                let ft = filetime::FileTime::from_unix_time(mtime, 0);
                filetime::set_file_mtime(p, ft)?;
            }
        }
    }

    info!(
        "expanded into {} bytes in {:.2}s ({:.2} MB/s)",
        outcome.bytes_written,
        start.elapsed().as_secs_f64(),
        throughput_mb_s(outcome.bytes_written, start.elapsed())
    );
    Ok(())
}

fn basename(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
}

fn mtime_of(path: &str) -> Option<i64> {
    let meta = std::fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    let secs = modified.duration_since(std::time::UNIX_EPOCH).ok()?;
    Some(secs.as_secs() as i64)
}

fn throughput_mb_s(bytes: u64, elapsed: std::time::Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 / 1_000_000.0) / secs
}
