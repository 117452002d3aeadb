use anyhow::{bail, Context};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;

use crate::solver::Lit;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Largest variable accepted from a file, in the header or in a clause. Well inside what
/// `Lit` can encode, and small enough that the solver's per-variable tables stay allocatable.
pub const MAX_VARS: usize = 1 << 24;

/// A parsed CNF formula. `num_vars` is the larger of the header count and the highest
/// variable actually used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cnf {
    pub num_vars: usize,
    pub clauses: Vec<Vec<Lit>>,
}

pub fn load_path(path: &Path) -> anyhow::Result<Cnf> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = if raw.starts_with(&GZIP_MAGIC) {
        let mut out = String::new();
        GzDecoder::new(raw.as_slice())
            .read_to_string(&mut out)
            .with_context(|| format!("failed to gunzip {}", path.display()))?;
        out
    } else {
        String::from_utf8(raw).with_context(|| format!("{} is not UTF-8", path.display()))?
    };
    parse(&text).with_context(|| format!("invalid DIMACS in {}", path.display()))
}

pub fn parse(text: &str) -> anyhow::Result<Cnf> {
    let mut cnf = Cnf::default();
    let mut header: Option<(usize, usize)> = None;
    let mut current: Vec<Lit> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        // SATLIB files end with "%\n0".
        if line.starts_with('%') {
            break;
        }
        if let Some(rest) = line.strip_prefix('p') {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            let [fmt, vars, clauses] = fields.as_slice() else {
                bail!("line {}: malformed header {line:?}", lineno + 1);
            };
            if *fmt != "cnf" {
                bail!("line {}: unsupported format {fmt:?}", lineno + 1);
            }
            let vars = vars
                .parse::<usize>()
                .with_context(|| format!("line {}: bad variable count", lineno + 1))?;
            if vars > MAX_VARS {
                bail!("line {}: {vars} variables exceeds the limit of {MAX_VARS}", lineno + 1);
            }
            let clauses = clauses
                .parse::<usize>()
                .with_context(|| format!("line {}: bad clause count", lineno + 1))?;
            header = Some((vars, clauses));
            cnf.num_vars = cnf.num_vars.max(vars);
            continue;
        }

        for tok in line.split_whitespace() {
            let n = tok
                .parse::<i64>()
                .with_context(|| format!("line {}: bad literal {tok:?}", lineno + 1))?;
            if n == 0 {
                cnf.clauses.push(std::mem::take(&mut current));
                continue;
            }
            if n.unsigned_abs() > MAX_VARS as u64 {
                bail!("line {}: literal {n} out of range", lineno + 1);
            }
            let lit = Lit::from_dimacs(n);
            cnf.num_vars = cnf.num_vars.max(lit.var() + 1);
            current.push(lit);
        }
    }

    if !current.is_empty() {
        cnf.clauses.push(current);
    }

    if let Some((_, expected)) = header
        && expected != cnf.clauses.len()
    {
        tracing::warn!(
            expected,
            found = cnf.clauses.len(),
            "DIMACS header clause count does not match"
        );
    }

    Ok(cnf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_header_comments_and_multiline_clauses() {
        let cnf = parse(
            "c tiny\n\
             p cnf 3 2\n\
             1 -2 0\n\
             2 3\n\
             -1 0\n",
        )
        .unwrap();

        assert_eq!(cnf.num_vars, 3);
        assert_eq!(
            cnf.clauses,
            vec![
                vec![Lit::from_dimacs(1), Lit::from_dimacs(-2)],
                vec![Lit::from_dimacs(2), Lit::from_dimacs(3), Lit::from_dimacs(-1)],
            ]
        );
    }

    #[test]
    fn variables_beyond_header_grow_the_count() {
        let cnf = parse("p cnf 2 1\n1 5 0\n").unwrap();
        assert_eq!(cnf.num_vars, 5);
    }

    #[test]
    fn stops_at_satlib_terminator() {
        let cnf = parse("p cnf 2 1\n1 2 0\n%\n0\n").unwrap();
        assert_eq!(cnf.clauses.len(), 1);
    }

    #[test]
    fn rejects_bad_tokens_and_headers() {
        assert!(parse("p cnf 2 1\n1 x 0\n").is_err());
        assert!(parse("p dnf 2 1\n1 0\n").is_err());
        assert!(parse("p cnf 2\n1 0\n").is_err());
    }

    #[test]
    fn rejects_out_of_range_variables() {
        // would wrap onto variable 0 if accepted
        assert!(parse("p cnf 1 2\n1 0\n-4294967297 0\n").is_err());
        assert!(parse("p cnf 1 1\n2147483649 0\n").is_err());
        assert!(parse(&format!("p cnf 1 1\n{} 0\n", MAX_VARS + 1)).is_err());
        assert!(parse("p cnf 1000000000 0\n").is_err());

        let cnf = parse(&format!("p cnf {MAX_VARS} 1\n-{MAX_VARS} 0\n")).unwrap();
        assert_eq!(cnf.num_vars, MAX_VARS);
        assert_eq!(cnf.clauses[0][0].var(), MAX_VARS - 1);
    }

    #[test]
    fn loads_plain_and_gzip_files() {
        let body = "p cnf 2 2\n1 2 0\n-1 0\n";
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("f.cnf");
        std::fs::write(&plain, body).unwrap();

        let gz = dir.path().join("f.cnf.gz");
        let mut enc = flate2::write::GzEncoder::new(
            std::fs::File::create(&gz).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(body.as_bytes()).unwrap();
        enc.finish().unwrap();

        let a = load_path(&plain).unwrap();
        let b = load_path(&gz).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.clauses.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_path(Path::new("/definitely/not/here.cnf")).is_err());
    }
}
