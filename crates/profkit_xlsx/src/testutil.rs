//! Formula evaluator for layout tests.
//!
//! Covers the subset emitted by the layouts: numbers, `+ - * /`, comparisons,
//! parentheses, `SUM AVERAGE STDEV ABS AND NOT ISBLANK`, A1 refs with `$`,
//! single-column ranges and `'sheet'!` refs. Blank cells are 0 in arithmetic
//! and skipped by aggregates.

use rust_xlsxwriter::{ColNum, RowNum};

use crate::spec::{EnumCellValue, SpecConditionalFormat, SpecSheetLayout, SpecWorkbookLayout};

#[derive(Debug, Clone, PartialEq)]
struct SpecRef {
    sheet: Option<String>,
    row: RowNum,
    col: ColNum,
    if_row_abs: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ref(SpecRef),
    Func(String),
    Op(String),
    LParen,
    RParen,
    Comma,
    Colon,
}

#[derive(Debug, Clone, PartialEq)]
enum EnumVal {
    Num(f64),
    Bool(bool),
    Blank,
    Range(Vec<Option<f64>>),
}

impl EnumVal {
    fn to_f64(&self) -> f64 {
        match self {
            EnumVal::Num(n) => *n,
            EnumVal::Bool(b) => f64::from(u8::from(*b)),
            EnumVal::Blank => 0.0,
            EnumVal::Range(_) => panic!("range used as a scalar"),
        }
    }

    fn is_truthy(&self) -> bool {
        self.to_f64() != 0.0
    }
}

/// Evaluates formulas over laid-out sheets.
pub struct FormulaEvaluator<'a> {
    l_sheets: Vec<&'a SpecSheetLayout>,
}

impl<'a> FormulaEvaluator<'a> {
    pub fn new(sheets: impl IntoIterator<Item = &'a SpecSheetLayout>) -> Self {
        Self {
            l_sheets: sheets.into_iter().collect(),
        }
    }

    pub fn for_workbook(workbook: &'a SpecWorkbookLayout) -> Self {
        Self::new(workbook.sheets.iter())
    }

    /// Numeric value of a cell; `None` for blank or text cells.
    pub fn cell_value(&self, sheet_name: &str, row: RowNum, col: ColNum) -> Option<f64> {
        let sheet = self
            .l_sheets
            .iter()
            .find(|sheet| sheet.sheet_name == sheet_name)
            .unwrap_or_else(|| panic!("unknown sheet {sheet_name}"));
        match &sheet.cell(row, col)?.value {
            EnumCellValue::Number(n) => Some(*n),
            EnumCellValue::Formula(f) => Some(self.evaluate(sheet_name, f)),
            EnumCellValue::String(_) => None,
        }
    }

    /// Evaluate `formula` as if it sat on `sheet_name`.
    pub fn evaluate(&self, sheet_name: &str, formula: &str) -> f64 {
        self.evaluate_shifted(sheet_name, formula, 0).to_f64()
    }

    /// Whether conditional format `spec` applies to `row` of its range.
    pub fn evaluate_rule_at(&self, sheet_name: &str, spec: &SpecConditionalFormat, row: RowNum) -> bool {
        assert!(spec.row_first <= row && row <= spec.row_last);
        let n_shift = i64::from(row) - i64::from(spec.row_first);
        self.evaluate_shifted(sheet_name, &spec.rule, n_shift)
            .is_truthy()
    }

    fn evaluate_shifted(&self, sheet_name: &str, formula: &str, n_row_shift: i64) -> EnumVal {
        let mut parser = Parser {
            evaluator: self,
            c_sheet: sheet_name,
            l_tokens: tokenize(formula.trim_start_matches('=')),
            pos: 0,
            n_row_shift,
        };
        let value = parser.parse_expr();
        assert_eq!(parser.pos, parser.l_tokens.len(), "trailing tokens in {formula}");
        value
    }
}

struct Parser<'e, 'a> {
    evaluator: &'e FormulaEvaluator<'a>,
    c_sheet: &'e str,
    l_tokens: Vec<Token>,
    pos: usize,
    n_row_shift: i64,
}

impl Parser<'_, '_> {
    fn peek(&self) -> Option<&Token> {
        self.l_tokens.get(self.pos)
    }

    fn next(&mut self) -> Token {
        let token = self.l_tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: Token) {
        assert_eq!(self.next(), token);
    }

    fn peek_op(&self, l_ops: &[&str]) -> Option<String> {
        match self.peek() {
            Some(Token::Op(op)) if l_ops.contains(&op.as_str()) => Some(op.clone()),
            _ => None,
        }
    }

    fn parse_expr(&mut self) -> EnumVal {
        let lhs = self.parse_add();
        let Some(op) = self.peek_op(&[">", "<", ">=", "<=", "=", "<>"]) else {
            return lhs;
        };
        self.pos += 1;
        let rhs = self.parse_add();
        let (a, b) = (lhs.to_f64(), rhs.to_f64());
        EnumVal::Bool(match op.as_str() {
            ">" => a > b,
            "<" => a < b,
            ">=" => a >= b,
            "<=" => a <= b,
            "=" => a == b,
            _ => a != b,
        })
    }

    fn parse_add(&mut self) -> EnumVal {
        let mut value = self.parse_mul();
        while let Some(op) = self.peek_op(&["+", "-"]) {
            self.pos += 1;
            let rhs = self.parse_mul().to_f64();
            let lhs = value.to_f64();
            value = EnumVal::Num(if op == "+" { lhs + rhs } else { lhs - rhs });
        }
        value
    }

    fn parse_mul(&mut self) -> EnumVal {
        let mut value = self.parse_unary();
        while let Some(op) = self.peek_op(&["*", "/"]) {
            self.pos += 1;
            let rhs = self.parse_unary().to_f64();
            let lhs = value.to_f64();
            value = EnumVal::Num(if op == "*" { lhs * rhs } else { lhs / rhs });
        }
        value
    }

    fn parse_unary(&mut self) -> EnumVal {
        if self.peek_op(&["-"]).is_some() {
            self.pos += 1;
            return EnumVal::Num(-self.parse_unary().to_f64());
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> EnumVal {
        match self.next() {
            Token::Num(n) => EnumVal::Num(n),
            Token::LParen => {
                let value = self.parse_expr();
                self.expect(Token::RParen);
                value
            }
            Token::Func(c_name) => {
                self.expect(Token::LParen);
                let mut l_args = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    loop {
                        l_args.push(self.parse_expr());
                        if self.peek() == Some(&Token::Comma) {
                            self.pos += 1;
                            continue;
                        }
                        break;
                    }
                }
                self.expect(Token::RParen);
                apply_function(&c_name, &l_args)
            }
            Token::Ref(spec_first) => {
                if self.peek() != Some(&Token::Colon) {
                    let row = self.shift(&spec_first);
                    return match self.read_cell(&spec_first, row) {
                        Some(n) => EnumVal::Num(n),
                        None => EnumVal::Blank,
                    };
                }
                self.pos += 1;
                let Token::Ref(spec_last) = self.next() else {
                    panic!("range end is not a reference");
                };
                let (row_a, row_b) = (self.shift(&spec_first), self.shift(&spec_last));
                assert_eq!(spec_first.col, spec_last.col, "only single-column ranges");
                EnumVal::Range(
                    (row_a.min(row_b)..=row_a.max(row_b))
                        .map(|row| self.read_cell(&spec_first, row))
                        .collect(),
                )
            }
            token => panic!("unexpected token {token:?}"),
        }
    }

    fn shift(&self, spec: &SpecRef) -> RowNum {
        if spec.if_row_abs {
            return spec.row;
        }
        RowNum::try_from(i64::from(spec.row) + self.n_row_shift).expect("row out of range")
    }

    fn read_cell(&self, spec: &SpecRef, row: RowNum) -> Option<f64> {
        let c_sheet = spec.sheet.as_deref().unwrap_or(self.c_sheet);
        self.evaluator.cell_value(c_sheet, row, spec.col)
    }
}

fn apply_function(c_name: &str, l_args: &[EnumVal]) -> EnumVal {
    let l_numbers = || -> Vec<f64> {
        l_args
            .iter()
            .flat_map(|arg| match arg {
                EnumVal::Range(l_cells) => l_cells.iter().flatten().copied().collect(),
                EnumVal::Blank => Vec::new(),
                other => vec![other.to_f64()],
            })
            .collect()
    };
    match c_name {
        "SUM" => EnumVal::Num(l_numbers().iter().sum()),
        "AVERAGE" => {
            let l_values = l_numbers();
            EnumVal::Num(l_values.iter().sum::<f64>() / l_values.len() as f64)
        }
        "STDEV" => {
            let l_values = l_numbers();
            let n = l_values.len() as f64;
            let n_mean = l_values.iter().sum::<f64>() / n;
            let n_var = l_values.iter().map(|v| (v - n_mean).powi(2)).sum::<f64>() / (n - 1.0);
            EnumVal::Num(n_var.sqrt())
        }
        "ABS" => EnumVal::Num(l_args[0].to_f64().abs()),
        "AND" => EnumVal::Bool(l_args.iter().all(EnumVal::is_truthy)),
        "NOT" => EnumVal::Bool(!l_args[0].is_truthy()),
        "ISBLANK" => EnumVal::Bool(matches!(l_args[0], EnumVal::Blank)),
        _ => panic!("unsupported function {c_name}"),
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let l_chars: Vec<char> = text.chars().collect();
    let mut l_tokens = Vec::new();
    let mut idx = 0;

    let read_word = |idx: &mut usize| -> String {
        let n_start = *idx;
        while *idx < l_chars.len()
            && (l_chars[*idx].is_ascii_alphanumeric() || matches!(l_chars[*idx], '$' | '_' | '.'))
        {
            *idx += 1;
        }
        l_chars[n_start..*idx].iter().collect()
    };

    while idx < l_chars.len() {
        let chr = l_chars[idx];
        match chr {
            ' ' => idx += 1,
            '(' => {
                l_tokens.push(Token::LParen);
                idx += 1;
            }
            ')' => {
                l_tokens.push(Token::RParen);
                idx += 1;
            }
            ',' => {
                l_tokens.push(Token::Comma);
                idx += 1;
            }
            ':' => {
                l_tokens.push(Token::Colon);
                idx += 1;
            }
            '<' | '>' => {
                let chr_next = l_chars.get(idx + 1).copied();
                if chr_next == Some('=') || (chr == '<' && chr_next == Some('>')) {
                    l_tokens.push(Token::Op(l_chars[idx..idx + 2].iter().collect()));
                    idx += 2;
                } else {
                    l_tokens.push(Token::Op(chr.to_string()));
                    idx += 1;
                }
            }
            '=' | '+' | '-' | '*' | '/' => {
                l_tokens.push(Token::Op(chr.to_string()));
                idx += 1;
            }
            '\'' => {
                let mut c_sheet = String::new();
                idx += 1;
                loop {
                    if l_chars[idx] == '\'' {
                        if l_chars.get(idx + 1) == Some(&'\'') {
                            c_sheet.push('\'');
                            idx += 2;
                            continue;
                        }
                        idx += 1;
                        break;
                    }
                    c_sheet.push(l_chars[idx]);
                    idx += 1;
                }
                assert_eq!(l_chars[idx], '!');
                idx += 1;
                let c_ref = read_word(&mut idx);
                l_tokens.push(Token::Ref(parse_ref(&c_ref, Some(c_sheet))));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let n_start = idx;
                while idx < l_chars.len() && (l_chars[idx].is_ascii_digit() || l_chars[idx] == '.') {
                    idx += 1;
                }
                let c_num: String = l_chars[n_start..idx].iter().collect();
                l_tokens.push(Token::Num(c_num.parse().expect("number literal")));
            }
            _ => {
                let c_word = read_word(&mut idx);
                assert!(!c_word.is_empty(), "unexpected character {chr:?}");
                match l_chars.get(idx) {
                    Some('(') => l_tokens.push(Token::Func(c_word.to_uppercase())),
                    Some('!') => {
                        idx += 1;
                        let c_ref = read_word(&mut idx);
                        l_tokens.push(Token::Ref(parse_ref(&c_ref, Some(c_word))));
                    }
                    _ => l_tokens.push(Token::Ref(parse_ref(&c_word, None))),
                }
            }
        }
    }
    l_tokens
}

fn parse_ref(text: &str, sheet: Option<String>) -> SpecRef {
    let c_rest = text.trim_start_matches('$');
    let n_letters = c_rest.chars().take_while(char::is_ascii_alphabetic).count();
    let (c_col, c_rest) = c_rest.split_at(n_letters);
    let if_row_abs = c_rest.starts_with('$');
    let c_row = c_rest.trim_start_matches('$');

    let col = c_col
        .chars()
        .fold(0u32, |acc, chr| acc * 26 + (chr.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
        - 1;
    let row: RowNum = c_row.parse().unwrap_or_else(|_| panic!("bad reference {text}"));
    SpecRef {
        sheet,
        row: row - 1,
        col: col as ColNum,
        if_row_abs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecCell;

    fn put(sheet: &mut SpecSheetLayout, row: RowNum, col: ColNum, value: EnumCellValue) {
        sheet.cells.insert((row, col), SpecCell { value, fmt: None });
    }

    #[test]
    fn evaluator_handles_ranges_refs_and_blanks() {
        let mut sheet = SpecSheetLayout::new("bob's run");
        put(&mut sheet, 0, 0, EnumCellValue::Number(2.0));
        put(&mut sheet, 1, 0, EnumCellValue::Number(4.0));
        put(&mut sheet, 3, 0, EnumCellValue::Number(6.0));
        put(&mut sheet, 0, 1, EnumCellValue::Formula("SUM(A1:A4)/$A$1".to_string()));
        let mut other = SpecSheetLayout::new("other");
        put(&mut other, 0, 0, EnumCellValue::Formula("'bob''s run'!B1*2".to_string()));

        let evaluator = FormulaEvaluator::new([&sheet, &other]);
        assert_eq!(evaluator.cell_value("bob's run", 0, 1), Some(6.0));
        assert_eq!(evaluator.cell_value("other", 0, 0), Some(12.0));
        assert_eq!(evaluator.evaluate("bob's run", "AVERAGE(A1:A4)"), 4.0);
        assert_eq!(evaluator.evaluate("bob's run", "STDEV(A1:A4)"), 2.0);
        assert_eq!(evaluator.evaluate("bob's run", "A3+1"), 1.0);
        assert_eq!(evaluator.evaluate("bob's run", "AND(ISBLANK(A3),NOT(ISBLANK(A4)),-A1<0)"), 1.0);
    }

    #[test]
    fn rule_rows_shift_relative_refs_only() {
        let mut sheet = SpecSheetLayout::new("s");
        put(&mut sheet, 0, 0, EnumCellValue::Number(1.0));
        put(&mut sheet, 1, 0, EnumCellValue::Number(5.0));
        let evaluator = FormulaEvaluator::new([&sheet]);
        let spec = SpecConditionalFormat {
            row_first: 0,
            row_last: 1,
            col: 0,
            rule: "A1>$A$1".to_string(),
            fmt: crate::conf::EnumFmtKey::Danger,
        };
        assert!(!evaluator.evaluate_rule_at("s", &spec, 0));
        assert!(evaluator.evaluate_rule_at("s", &spec, 1));
    }
}
