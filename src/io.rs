/*!
 * 单纯形存储的文本交换格式
 *
 * ```text
 * # 注释行与空行会被忽略
 * 2                 方向数 r
 * 0.0 0.5 1.0       方向 0 的阈值（升序）
 * 0.0 1.0           方向 1 的阈值
 * 3                 顶点数
 * 2                 最高维度
 * 0 : 0 0           每行一个单纯形：顶点 : 每个方向的过滤坐标
 * 0 1 : 1 0
 * ```
 *
 * 写出时单纯形按 (维度, 索引) 排序；写出后再读入得到等价的存储。
 */

use crate::core::grid::FiltrationGrid;
use crate::core::simplex::simplex_vertices;
use crate::core::storage::{LookupStrategy, SimplexStore, SimplexStoreBuilder};
use crate::error::{PersistenceError, Result};
use crate::types::{Position, Value};
use std::io::{BufRead, Write};
use std::str::FromStr;

/// 跳过空行与注释，保留 1 开始的行号
struct Lines<R> {
    inner: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line: 0,
        }
    }

    fn next_content(&mut self) -> Result<Option<(usize, String)>> {
        for text in self.inner.by_ref() {
            let text = text?;
            self.line += 1;
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(Some((self.line, trimmed.to_string())));
        }
        Ok(None)
    }

    fn expect_content(&mut self, what: &str) -> Result<(usize, String)> {
        self.next_content()?.ok_or_else(|| PersistenceError::Parse {
            line: self.line + 1,
            message: format!("unexpected end of input, expected {}", what),
        })
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> PersistenceError {
    PersistenceError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_values<T: FromStr>(line: usize, text: &str, what: &str) -> Result<Vec<T>> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| parse_error(line, format!("invalid {} '{}'", what, token)))
        })
        .collect()
}

fn parse_single<T: FromStr>(line: usize, text: &str, what: &str) -> Result<T> {
    let values: Vec<T> = parse_values(line, text, what)?;
    match <[T; 1]>::try_from(values) {
        Ok([value]) => Ok(value),
        Err(values) => Err(parse_error(
            line,
            format!("expected a single {}, found {} values", what, values.len()),
        )),
    }
}

/// 读取文本格式并构建 `SimplexStore`
///
/// # Errors
///
/// - `Parse`: 格式错误（带 1 开始的行号），包括单纯形本身非法
/// - `InvalidInput`: 读取完成后面检查失败（缺少面或面出生更晚）
/// - `Io`: 底层读取失败
pub fn read_simplex_store<R: BufRead>(reader: R, lookup: LookupStrategy) -> Result<SimplexStore> {
    let mut lines = Lines::new(reader);

    let (line, text) = lines.expect_content("direction count")?;
    let directions: usize = parse_single(line, &text, "direction count")?;
    if directions == 0 {
        return Err(parse_error(line, "direction count must be positive"));
    }

    let mut thresholds = Vec::with_capacity(directions);
    for d in 0..directions {
        let (line, text) = lines.expect_content(&format!("thresholds of direction {}", d))?;
        thresholds.push(parse_values::<Value>(line, &text, "threshold")?);
    }
    let filtration =
        FiltrationGrid::new(thresholds).map_err(|e| parse_error(lines.line, e.to_string()))?;

    let (line, text) = lines.expect_content("vertex count")?;
    let num_vertices: usize = parse_single(line, &text, "vertex count")?;
    let (line, text) = lines.expect_content("max dimension")?;
    let max_dimension: usize = parse_single(line, &text, "max dimension")?;

    let mut builder = SimplexStoreBuilder::try_new(filtration, num_vertices, max_dimension)
        .map_err(|e| parse_error(line, e.to_string()))?;
    while let Some((line, text)) = lines.next_content()? {
        let (vertex_part, coord_part) = text
            .split_once(':')
            .ok_or_else(|| parse_error(line, "expected 'vertices : coordinates'"))?;
        let vertices: Vec<usize> = parse_values(line, vertex_part, "vertex")?;
        let coords: Vec<usize> = parse_values(line, coord_part, "filtration index")?;
        if coords.len() != directions {
            return Err(parse_error(
                line,
                format!("expected {} filtration indices, found {}", directions, coords.len()),
            ));
        }
        builder
            .add_simplex(&vertices, &Position::new(coords))
            .map_err(|e| parse_error(line, e.to_string()))?;
    }

    builder.build(lookup)
}

/// 写出文本格式
pub fn write_simplex_store<W: Write>(store: &SimplexStore, mut writer: W) -> Result<()> {
    let filtration = store.filtration();
    writeln!(writer, "{}", filtration.directions())?;
    for d in 0..filtration.directions() {
        let values: Vec<String> = filtration.thresholds(d).iter().map(|t| t.to_string()).collect();
        writeln!(writer, "{}", values.join(" "))?;
    }
    writeln!(writer, "{}", store.num_vertices())?;
    writeln!(writer, "{}", store.max_dimension())?;

    for (simplex, position) in store.iter() {
        let vertices = simplex_vertices(simplex, store.num_vertices(), store.binomial());
        let vertices: Vec<String> = vertices.iter().map(|v| v.to_string()).collect();
        let coords: Vec<String> = position.coords().iter().map(|c| c.to_string()).collect();
        writeln!(writer, "{} : {}", vertices.join(" "), coords.join(" "))?;
    }
    writer.flush()?;
    Ok(())
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Simplex;

    const TRIANGLE: &str = "\
# two-direction triangle
2
0.0 0.5 1.0
0.0 1.0

3
2
0 : 0 0
1 : 0 0
2 : 1 0
0 1 : 0 1
0 2 : 1 0
1 2 : 2 1
0 1 2 : 2 1
";

    #[test]
    fn test_read_triangle() {
        let store = read_simplex_store(TRIANGLE.as_bytes(), LookupStrategy::Dense).unwrap();

        assert_eq!(store.len(), 7);
        assert_eq!(store.num_vertices(), 3);
        assert_eq!(store.max_dimension(), 2);
        assert_eq!(store.filtration().thresholds(0), &[0.0, 0.5, 1.0]);
        assert_eq!(store.birth(&Simplex::new(2, 0)), Some(Position::new(vec![1, 0])));
        assert_eq!(store.simplices_leq(2, &Position::new(vec![2, 1])).len(), 1);
    }

    #[test]
    fn test_write_then_read() {
        let store = read_simplex_store(TRIANGLE.as_bytes(), LookupStrategy::Dense).unwrap();
        let mut buffer = Vec::new();
        write_simplex_store(&store, &mut buffer).unwrap();

        let reread = read_simplex_store(buffer.as_slice(), LookupStrategy::Sparse).unwrap();
        assert_eq!(
            store.iter().collect::<Vec<_>>(),
            reread.iter().collect::<Vec<_>>()
        );
        assert_eq!(store.filtration(), reread.filtration());

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with("0 1 2 : 2 1\n"));
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let cases = [
            ("x\n", 1),
            ("1\n0.0 1.0\n2\n1\n0 1\n", 5),
            ("1\n0.0 1.0\n2\n1\n0 : 0 0\n", 5),
            ("1\n0.0 1.0\n2\n1\n0 : 0\n# comment\n5 : 0\n", 7),
            ("1\n0.0 1.0\n2\n", 4),
        ];

        for (input, expected) in cases {
            match read_simplex_store(input.as_bytes(), LookupStrategy::Dense) {
                Err(PersistenceError::Parse { line, .. }) => {
                    assert_eq!(line, expected, "wrong line for input {:?}", input)
                }
                other => panic!("expected parse error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_oversized_header_is_a_parse_error() {
        // C(200, 42) 超出 i64；巨大的 max dimension 不能触发巨量分配
        let cases = ["1\n0.0 1.0\n200\n40\n", "1\n0.0 1.0\n3\n18446744073709551615\n"];

        for input in cases {
            match read_simplex_store(input.as_bytes(), LookupStrategy::Dense) {
                Err(PersistenceError::Parse { line, .. }) => assert_eq!(line, 4),
                other => panic!("expected parse error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_missing_face_is_rejected_after_parsing() {
        let input = "1\n0.0\n2\n1\n0 : 0\n0 1 : 0\n";
        assert!(matches!(
            read_simplex_store(input.as_bytes(), LookupStrategy::Dense),
            Err(PersistenceError::InvalidInput(_))
        ));
    }
}
