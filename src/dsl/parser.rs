//! Line parser for the netlist format.

use super::ast::*;
use crate::error::{CircuitError, Result};

/// Parser for netlist text.
pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    /// Create a new parser over the given text.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Parse every component line, stopping at the first malformed one.
    pub fn parse(&self) -> Result<NetlistAst> {
        let mut ast = NetlistAst::new();

        for (idx, raw) in self.input.lines().enumerate() {
            let line = idx + 1;
            let content = strip_comment(raw);
            if content.trim().is_empty() {
                continue;
            }
            ast.components.push(parse_component(content, line)?);
        }

        Ok(ast)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(['#', ';']) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_component(content: &str, line: usize) -> Result<ComponentDef> {
    let mut fields = content.split_whitespace();

    let symbol = fields
        .next()
        .ok_or(CircuitError::MissingField { field: "symbol", line })?;
    let kind = ComponentKind::from_symbol(symbol).ok_or_else(|| {
        CircuitError::UnknownComponentType {
            symbol: symbol.to_string(),
            line,
        }
    })?;

    let start = parse_node(fields.next(), "start node", line)?;
    let end = parse_node(fields.next(), "end node", line)?;

    let value_text = fields
        .next()
        .ok_or(CircuitError::MissingField { field: "value", line })?;
    let value = parse_value(value_text)
        .ok_or_else(|| CircuitError::invalid_number("value", value_text, line))?;

    if let Some(extra) = fields.next() {
        return Err(CircuitError::UnexpectedToken {
            token: extra.to_string(),
            line,
        });
    }

    // The op-amp reuses the value field for its output node.
    if kind == ComponentKind::IdealOpAmp && !is_node_index(value) {
        return Err(CircuitError::invalid_number("output node", value_text, line));
    }

    Ok(ComponentDef {
        kind,
        symbol: symbol.to_string(),
        start,
        end,
        value,
        line,
    })
}

fn parse_node(token: Option<&str>, field: &'static str, line: usize) -> Result<usize> {
    let text = token.ok_or(CircuitError::MissingField { field, line })?;
    text.parse::<usize>()
        .map_err(|_| CircuitError::invalid_number(field, text, line))
}

fn is_node_index(value: f64) -> bool {
    value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64
}

/// Parse a number string with optional unit suffix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(last) = text.chars().last() {
        let mult = match last {
            'p' => 1e-12,
            'n' => 1e-9,
            'u' | 'µ' => 1e-6,
            'm' => 1e-3,
            'k' | 'K' => 1e3,
            'M' => 1e6,
            'G' => 1e9,
            _ => 1.0,
        };
        if mult != 1.0 {
            (&text[..text.len() - last.len_utf8()], mult)
        } else {
            (text, 1.0)
        }
    } else {
        (text, 1.0)
    };

    let value = num_str.parse::<f64>().ok()? * multiplier;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse;

    fn approx_eq(a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(x), Some(y)) => (x - y).abs() < x.abs() * 1e-10 + 1e-15,
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn test_parse_value() {
        assert!(approx_eq(parse_value("10k"), Some(10_000.0)));
        assert!(approx_eq(parse_value("100n"), Some(100e-9)));
        assert!(approx_eq(parse_value("4.7u"), Some(4.7e-6)));
        assert!(approx_eq(parse_value("1M"), Some(1_000_000.0)));
        assert!(approx_eq(parse_value("2.2"), Some(2.2)));
        assert!(approx_eq(parse_value("1e-9"), Some(1e-9)));
        assert!(approx_eq(parse_value("-3"), Some(-3.0)));
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value("k"), None);
        assert_eq!(parse_value("inf"), None);
    }

    #[test]
    fn test_parse_resistor() {
        let ast = parse("R 1 2 10k").unwrap();
        assert_eq!(ast.components.len(), 1);
        let r = &ast.components[0];
        assert_eq!(r.kind, ComponentKind::Resistor);
        assert_eq!((r.start, r.end), (1, 2));
        assert_eq!(r.value, 10_000.0);
        assert_eq!(r.line, 1);
    }

    #[test]
    fn test_parse_keeps_file_order() {
        let ast = parse("Vi 1 0 0\nR 1 2 1000\nC 2 0 1e-6\nVo 2 0 0\n").unwrap();
        let kinds: Vec<_> = ast.components.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ComponentKind::ExternalVoltageSource,
                ComponentKind::Resistor,
                ComponentKind::Capacitor,
                ComponentKind::VoltageProbe,
            ]
        );
    }

    #[test]
    fn test_parse_with_comments_and_blank_lines() {
        let input = "# RC low-pass\n\nR 1 2 1k ; series\n   \nC 2 0 100n\n";
        let ast = parse(input).unwrap();
        assert_eq!(ast.components.len(), 2);
        assert_eq!(ast.components[1].line, 5);
    }

    #[test]
    fn test_parse_tabs_and_crlf() {
        let ast = parse("R\t1\t2\t1000\r\nVo 2 0 0\r\n").unwrap();
        assert_eq!(ast.components.len(), 2);
    }

    #[test]
    fn test_unknown_symbol() {
        let err = parse("R 1 0 1k\nX 1 0 1").unwrap_err();
        assert!(matches!(
            err,
            CircuitError::UnknownComponentType { line: 2, .. }
        ));
    }

    #[test]
    fn test_lowercase_symbol_is_unknown() {
        let err = parse("Vi 1 0 0\nr 1 2 1k\nVo 2 0 0").unwrap_err();
        assert!(matches!(
            err,
            CircuitError::UnknownComponentType { line: 2, .. }
        ));

        // Uppercase second letter: an ideal source, not the output probe
        let ast = parse("Vi 1 0 0\nVO 1 0 0\nVo 1 0 0").unwrap();
        assert_eq!(ast.components[1].kind, ComponentKind::VoltageSource);
    }

    #[test]
    fn test_missing_value() {
        let err = parse("R 1 0").unwrap_err();
        assert!(matches!(
            err,
            CircuitError::MissingField { field: "value", line: 1 }
        ));
    }

    #[test]
    fn test_missing_node() {
        let err = parse("Vo 1").unwrap_err();
        assert!(matches!(
            err,
            CircuitError::MissingField { field: "end node", .. }
        ));
    }

    #[test]
    fn test_non_numeric_fields() {
        assert!(matches!(
            parse("R 1 0 abc").unwrap_err(),
            CircuitError::InvalidNumber { field: "value", .. }
        ));
        assert!(matches!(
            parse("R a 0 1k").unwrap_err(),
            CircuitError::InvalidNumber { field: "start node", .. }
        ));
        assert!(matches!(
            parse("R 1 -2 1k").unwrap_err(),
            CircuitError::InvalidNumber { field: "end node", .. }
        ));
    }

    #[test]
    fn test_extra_field_rejected() {
        assert!(matches!(
            parse("R 1 0 1k 5").unwrap_err(),
            CircuitError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_opamp_output_node() {
        let ast = parse("O 0 2 3").unwrap();
        assert_eq!(ast.components[0].kind, ComponentKind::IdealOpAmp);
        assert_eq!(ast.components[0].value, 3.0);

        assert!(matches!(
            parse("O 0 2 1.5").unwrap_err(),
            CircuitError::InvalidNumber { field: "output node", .. }
        ));
        assert!(parse("O 0 2 -1").is_err());
    }
}
