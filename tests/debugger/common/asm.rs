//! Two pass assembler for the handful of RV32I instructions the test programs use.

use rvdebug::debugger::address::{text_address, TEXT_BASE};
use rvdebug::debugger::Register;
use std::collections::HashMap;

pub struct Program {
    pub words: Vec<u32>,
    /// Source line (1-based) of every word.
    pub lines: Vec<u32>,
    pub labels: Vec<(String, u32)>,
}

#[derive(Debug)]
pub struct AsmError {
    pub line: u32,
    pub message: String,
}

struct Statement<'a> {
    line: u32,
    mnemonic: &'a str,
    operands: Vec<&'a str>,
    addr: u32,
}

fn err<T>(line: u32, message: impl Into<String>) -> Result<T, AsmError> {
    Err(AsmError {
        line,
        message: message.into(),
    })
}

fn fits_i12(imm: i64) -> bool {
    (-2048..=2047).contains(&imm)
}

fn parse_imm(line: u32, text: &str) -> Result<i64, AsmError> {
    let (neg, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    };
    match value {
        Ok(v) if neg => Ok(-v),
        Ok(v) => Ok(v),
        Err(_) => err(line, format!("invalid immediate `{text}`")),
    }
}

fn parse_reg(line: u32, text: &str) -> Result<u32, AsmError> {
    match Register::from_name(text) {
        Ok(reg) => Ok(reg.index() as u32),
        Err(_) => err(line, format!("unknown register `{text}`")),
    }
}

/// `off(reg)` operand.
fn parse_mem(line: u32, text: &str) -> Result<(i64, u32), AsmError> {
    let Some((off, rest)) = text.split_once('(') else {
        return err(line, format!("expected memory operand, got `{text}`"));
    };
    let Some(reg) = rest.strip_suffix(')') else {
        return err(line, format!("expected memory operand, got `{text}`"));
    };
    let off = if off.trim().is_empty() {
        0
    } else {
        parse_imm(line, off.trim())?
    };
    Ok((off, parse_reg(line, reg.trim())?))
}

fn encode_i(op: u32, rd: u32, f3: u32, rs1: u32, imm: i64) -> u32 {
    ((imm as u32 & 0xfff) << 20) | (rs1 << 15) | (f3 << 12) | (rd << 7) | op
}

fn encode_r(rd: u32, f3: u32, rs1: u32, rs2: u32, f7: u32) -> u32 {
    (f7 << 25) | (rs2 << 20) | (rs1 << 15) | (f3 << 12) | (rd << 7) | 0x33
}

fn encode_s(f3: u32, rs1: u32, rs2: u32, imm: i64) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7f) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (f3 << 12)
        | ((imm & 0x1f) << 7)
        | 0x23
}

fn encode_b(f3: u32, rs1: u32, rs2: u32, offset: i64) -> u32 {
    let imm = offset as u32;
    (((imm >> 12) & 1) << 31)
        | (((imm >> 5) & 0x3f) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (f3 << 12)
        | (((imm >> 1) & 0xf) << 8)
        | (((imm >> 11) & 1) << 7)
        | 0x63
}

fn encode_j(rd: u32, offset: i64) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | (rd << 7)
        | 0x6f
}

fn encode_lui(rd: u32, upper: u32) -> u32 {
    (upper & 0xffff_f000) | (rd << 7) | 0x37
}

/// Words a statement expands to.
fn word_count(line: u32, mnemonic: &str, operands: &[&str]) -> Result<u32, AsmError> {
    Ok(match mnemonic {
        "li" => {
            let imm = operands.get(1).map(|o| parse_imm(line, o)).transpose()?;
            match imm {
                Some(imm) if !fits_i12(imm) => 2,
                _ => 1,
            }
        }
        "emu_exit" => 2,
        _ => 1,
    })
}

pub fn assemble(source: &str) -> Result<Program, AsmError> {
    let mut labels = HashMap::new();
    let mut label_list = vec![];
    let mut statements = vec![];
    let mut count = 0u32;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx as u32 + 1;
        let mut text = raw.split('#').next().unwrap_or_default().trim();

        while let Some((label, rest)) = text.split_once(':') {
            let label = label.trim();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return err(line, format!("invalid label `{label}`"));
            }
            let addr = TEXT_BASE + count * 4;
            if labels.insert(label.to_string(), addr).is_some() {
                return err(line, format!("duplicate label `{label}`"));
            }
            label_list.push((label.to_string(), addr));
            text = rest.trim();
        }
        if text.is_empty() {
            continue;
        }

        let (mnemonic, rest) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));
        let operands: Vec<&str> = rest
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .collect();

        if mnemonic.starts_with('.') && mnemonic != ".word" {
            continue;
        }

        let size = word_count(line, mnemonic, &operands)?;
        statements.push(Statement {
            line,
            mnemonic,
            operands,
            addr: TEXT_BASE + count * 4,
        });
        count += size;
    }

    let mut words = vec![];
    let mut lines = vec![];
    for stmt in &statements {
        for word in encode(stmt, &labels)? {
            words.push(word);
            lines.push(stmt.line);
        }
    }
    debug_assert_eq!(words.len(), count as usize);
    debug_assert_eq!(text_address(words.len()), TEXT_BASE + count * 4);

    Ok(Program {
        words,
        lines,
        labels: label_list,
    })
}

fn encode(stmt: &Statement, labels: &HashMap<String, u32>) -> Result<Vec<u32>, AsmError> {
    let line = stmt.line;
    let ops = &stmt.operands;
    let expect = |n: usize| -> Result<(), AsmError> {
        if ops.len() != n {
            return err(line, format!("`{}` expects {n} operands", stmt.mnemonic));
        }
        Ok(())
    };
    let target = |name: &str| -> Result<i64, AsmError> {
        match labels.get(name) {
            Some(addr) => Ok(*addr as i64 - stmt.addr as i64),
            None => err(line, format!("undefined label `{name}`")),
        }
    };

    let words = match stmt.mnemonic {
        "nop" => vec![encode_i(0x13, 0, 0, 0, 0)],
        "li" => {
            expect(2)?;
            let rd = parse_reg(line, ops[0])?;
            let imm = parse_imm(line, ops[1])?;
            if fits_i12(imm) {
                vec![encode_i(0x13, rd, 0, 0, imm)]
            } else {
                let imm = imm as i32;
                let lo = (imm << 20) >> 20;
                let hi = imm.wrapping_sub(lo) as u32;
                vec![encode_lui(rd, hi), encode_i(0x13, rd, 0, rd, lo as i64)]
            }
        }
        "lui" => {
            expect(2)?;
            let upper = parse_imm(line, ops[1])? as u32;
            vec![encode_lui(parse_reg(line, ops[0])?, upper << 12)]
        }
        "mv" => {
            expect(2)?;
            vec![encode_i(
                0x13,
                parse_reg(line, ops[0])?,
                0,
                parse_reg(line, ops[1])?,
                0,
            )]
        }
        "addi" => {
            expect(3)?;
            let imm = parse_imm(line, ops[2])?;
            if !fits_i12(imm) {
                return err(line, "immediate out of range");
            }
            vec![encode_i(
                0x13,
                parse_reg(line, ops[0])?,
                0,
                parse_reg(line, ops[1])?,
                imm,
            )]
        }
        "add" | "sub" => {
            expect(3)?;
            let f7 = if stmt.mnemonic == "sub" { 0x20 } else { 0 };
            vec![encode_r(
                parse_reg(line, ops[0])?,
                0,
                parse_reg(line, ops[1])?,
                parse_reg(line, ops[2])?,
                f7,
            )]
        }
        "lw" => {
            expect(2)?;
            let (off, rs1) = parse_mem(line, ops[1])?;
            vec![encode_i(0x03, parse_reg(line, ops[0])?, 2, rs1, off)]
        }
        "sw" => {
            expect(2)?;
            let (off, rs1) = parse_mem(line, ops[1])?;
            vec![encode_s(2, rs1, parse_reg(line, ops[0])?, off)]
        }
        "beq" | "bne" | "blt" | "bge" => {
            expect(3)?;
            let f3 = match stmt.mnemonic {
                "beq" => 0,
                "bne" => 1,
                "blt" => 4,
                _ => 5,
            };
            vec![encode_b(
                f3,
                parse_reg(line, ops[0])?,
                parse_reg(line, ops[1])?,
                target(ops[2])?,
            )]
        }
        "beqz" | "bnez" => {
            expect(2)?;
            let f3 = if stmt.mnemonic == "beqz" { 0 } else { 1 };
            vec![encode_b(f3, parse_reg(line, ops[0])?, 0, target(ops[1])?)]
        }
        "j" => {
            expect(1)?;
            vec![encode_j(0, target(ops[0])?)]
        }
        "call" => {
            expect(1)?;
            vec![encode_j(1, target(ops[0])?)]
        }
        "jal" => match ops.len() {
            1 => vec![encode_j(1, target(ops[0])?)],
            2 => vec![encode_j(parse_reg(line, ops[0])?, target(ops[1])?)],
            _ => return err(line, "`jal` expects 1 or 2 operands"),
        },
        "jr" => {
            expect(1)?;
            vec![encode_i(0x67, 0, 0, parse_reg(line, ops[0])?, 0)]
        }
        "jalr" => match ops.len() {
            1 => vec![encode_i(0x67, 1, 0, parse_reg(line, ops[0])?, 0)],
            3 => vec![encode_i(
                0x67,
                parse_reg(line, ops[0])?,
                0,
                parse_reg(line, ops[1])?,
                parse_imm(line, ops[2])?,
            )],
            _ => return err(line, "`jalr` expects 1 or 3 operands"),
        },
        "ret" => vec![encode_i(0x67, 0, 0, 1, 0)],
        "ecall" => vec![0x73],
        "emu_exit" => vec![encode_i(0x13, 17, 0, 0, 93), 0x73],
        ".word" => {
            expect(1)?;
            vec![parse_imm(line, ops[0])? as u32]
        }
        other => return err(line, format!("unknown instruction `{other}`")),
    };
    Ok(words)
}
