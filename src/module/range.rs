//! 语义化版本范围
//!
//! 支持的语法：
//!
//! - 比较运算符：`<` `<=` `>` `>=` `=`
//! - `^1.2.3`、`~1.2.3`（以及 `~>1.2.3`）
//! - 通配范围：`*`、`1.x`、`1.2.*`、部分版本 `1.2`
//! - 连字符范围：`1.2.3 - 2.3`，可与其他比较器组成交集（`1.0.0 - 2.0.0 >=1.5.0`）
//! - 空白分隔的交集与 `||` 分隔的并集，空范围等价于 `*`
//!
//! 每个范围先展开为若干组原始比较器（组内取交集、组间取并集），再逐一比较。
//! 带预发布标签的版本只在同组内存在相同 `major.minor.patch` 且带预发布标签的比较器时
//! 才可能满足范围，除非启用了 [`RangeOptions::include_prerelease`]。

use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};

use crate::module::version::parse_version;
use crate::utils::{CoreError, Result};

/// 范围匹配选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeOptions {
    /// 允许预发布版本像正式版本一样参与匹配
    #[serde(default)]
    pub include_prerelease: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Eq => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Lt => version < &self.version,
            Op::Le => version <= &self.version,
            Op::Gt => version > &self.version,
            Op::Ge => version >= &self.version,
            Op::Eq => version == &self.version,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// 组内比较器，空表示匹配任意正式版本
type ComparatorSet = Vec<Comparator>;

/// 语义化版本范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    options: RangeOptions,
    sets: Vec<ComparatorSet>,
}

impl VersionRange {
    /// 使用默认选项解析范围表达式
    ///
    /// # Errors
    ///
    /// 表达式不合法时返回 `InvalidRange`
    pub fn parse(range: &str) -> Result<Self> {
        Self::parse_with(range, RangeOptions::default())
    }

    /// 使用指定选项解析范围表达式
    pub fn parse_with(range: &str, options: RangeOptions) -> Result<Self> {
        let invalid = |reason: String| CoreError::InvalidRange {
            range: range.to_string(),
            reason,
        };

        let mut sets = Vec::new();
        for part in range.split("||") {
            let set = parse_set(part.trim(), options).map_err(invalid)?;
            sets.push(set);
        }

        Ok(Self {
            raw: range.to_string(),
            options,
            sets,
        })
    }

    /// 原始表达式
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 解析时使用的选项
    pub fn options(&self) -> RangeOptions {
        self.options
    }

    /// 判断版本是否满足范围
    pub fn matches(&self, version: &Version) -> bool {
        let version = if version.build.is_empty() {
            version.clone()
        } else {
            let mut v = version.clone();
            v.build = BuildMetadata::EMPTY;
            v
        };

        self.sets
            .iter()
            .any(|set| set_matches(set, &version, self.options))
    }
}

impl fmt::Display for VersionRange {
    /// 输出展开后的比较器形式，例如 `^1.2.3` 输出 `>=1.2.3 <2.0.0-0`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, set) in self.sets.iter().enumerate() {
            if i > 0 {
                f.write_str("||")?;
            }
            if set.is_empty() {
                f.write_str("*")?;
                continue;
            }
            for (j, comparator) in set.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", comparator)?;
            }
        }
        Ok(())
    }
}

/// 判断版本字符串是否满足范围表达式
///
/// 版本或范围无法解析时返回 `false`，不会报错。
pub fn satisfies(version: &str, range: &str) -> bool {
    satisfies_with(version, range, RangeOptions::default())
}

/// 使用指定选项判断版本字符串是否满足范围表达式
pub fn satisfies_with(version: &str, range: &str, options: RangeOptions) -> bool {
    let version = match parse_version(version) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("版本无法解析，视为不满足: {}", e);
            return false;
        }
    };

    match VersionRange::parse_with(range, options) {
        Ok(range) => range.matches(&version),
        Err(e) => {
            tracing::debug!("范围无法解析，视为不满足: {}", e);
            false
        }
    }
}

fn set_matches(set: &[Comparator], version: &Version, options: RangeOptions) -> bool {
    if !set.iter().all(|c| c.matches(version)) {
        return false;
    }

    if version.pre.is_empty() || options.include_prerelease {
        return true;
    }

    set.iter().any(|c| {
        !c.version.pre.is_empty()
            && c.version.major == version.major
            && c.version.minor == version.minor
            && c.version.patch == version.patch
    })
}

// ============================================================================
// 解析
// ============================================================================

/// 部分版本：缺失或通配的分量为 `None`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn parse(input: &str) -> std::result::Result<Self, String> {
        let text = input.trim_start_matches('=');
        let text = text.strip_prefix('v').unwrap_or(text);
        if text.is_empty() {
            return Err(format!("缺少版本号: '{}'", input));
        }

        // 构建元数据不参与比较
        let text = text.split_once('+').map_or(text, |(core, _)| core);
        let (core, pre) = match text.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (text, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(format!("版本分量过多: '{}'", input));
        }

        let mut numbers = [None; 3];
        let mut wildcard = false;
        for (slot, part) in numbers.iter_mut().zip(parts.iter()) {
            if wildcard || matches!(*part, "x" | "X" | "*") {
                wildcard = true;
                continue;
            }
            *slot = Some(parse_component(part).ok_or_else(|| format!("无效的版本分量: '{}'", input))?);
        }

        let pre = match pre {
            Some(pre) => {
                if numbers.iter().any(Option::is_none) {
                    return Err(format!("不完整的版本不能带预发布标签: '{}'", input));
                }
                Prerelease::new(pre).map_err(|e| format!("无效的预发布标签 '{}': {}", input, e))?
            }
            None => Prerelease::EMPTY,
        };

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre,
        })
    }
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

fn bump(n: u64) -> std::result::Result<u64, String> {
    n.checked_add(1).ok_or_else(|| "版本分量溢出".to_string())
}

fn version(major: u64, minor: u64, patch: u64) -> Version {
    Version::new(major, minor, patch)
}

fn with_pre(mut v: Version, pre: &Prerelease) -> Version {
    v.pre = pre.clone();
    v
}

/// 排他上界，`-0` 排除该版本的所有预发布版本
fn upper(major: u64, minor: u64, patch: u64) -> Version {
    let mut v = version(major, minor, patch);
    v.pre = Prerelease::new("0").unwrap_or(Prerelease::EMPTY);
    v
}

/// 通配展开得到的下界，启用预发布匹配时包含该版本的预发布版本
fn lower(major: u64, minor: u64, patch: u64, options: RangeOptions) -> Version {
    if options.include_prerelease {
        upper(major, minor, patch)
    } else {
        version(major, minor, patch)
    }
}

/// 不匹配任何版本的比较器组
fn nothing() -> ComparatorSet {
    vec![Comparator::new(Op::Lt, upper(0, 0, 0))]
}

const OPERATORS: [&str; 8] = ["~>", "~", "^", "<=", ">=", "<", ">", "="];

fn parse_set(text: &str, options: RangeOptions) -> std::result::Result<ComparatorSet, String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut set = ComparatorSet::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if tokens.get(i + 1) == Some(&"-") {
            let to = tokens
                .get(i + 2)
                .ok_or_else(|| format!("连字符范围 '{} -' 缺少上界", token))?;
            set.extend(hyphen(token, to, options)?);
            i += 3;
        } else if OPERATORS.contains(&token) {
            // 运算符与版本之间允许空白：">= 1.2.3"
            let next = tokens
                .get(i + 1)
                .ok_or_else(|| format!("运算符 '{}' 之后缺少版本号", token))?;
            set.extend(comparator(&format!("{}{}", token, next), options)?);
            i += 2;
        } else {
            set.extend(comparator(token, options)?);
            i += 1;
        }
    }
    Ok(set)
}

fn comparator(token: &str, options: RangeOptions) -> std::result::Result<ComparatorSet, String> {
    let (op, rest) = OPERATORS
        .iter()
        .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("", token));

    if rest.starts_with(['<', '>', '~', '^']) {
        return Err(format!("无效的比较器: '{}'", token));
    }

    let partial = Partial::parse(rest)?;
    match op {
        "^" => caret(&partial, options),
        "~" | "~>" => tilde(&partial, options),
        "<" => primitive(Some(Op::Lt), &partial, options),
        "<=" => primitive(Some(Op::Le), &partial, options),
        ">" => primitive(Some(Op::Gt), &partial, options),
        ">=" => primitive(Some(Op::Ge), &partial, options),
        _ => primitive(None, &partial, options),
    }
}

fn caret(p: &Partial, options: RangeOptions) -> std::result::Result<ComparatorSet, String> {
    let Some(major) = p.major else {
        return Ok(ComparatorSet::new());
    };

    let set = match (p.minor, p.patch) {
        (None, _) => vec![
            Comparator::new(Op::Ge, lower(major, 0, 0, options)),
            Comparator::new(Op::Lt, upper(bump(major)?, 0, 0)),
        ],
        (Some(minor), None) => {
            let ceiling = if major == 0 {
                upper(0, bump(minor)?, 0)
            } else {
                upper(bump(major)?, 0, 0)
            };
            vec![
                Comparator::new(Op::Ge, lower(major, minor, 0, options)),
                Comparator::new(Op::Lt, ceiling),
            ]
        }
        (Some(minor), Some(patch)) => {
            let ceiling = if major > 0 {
                upper(bump(major)?, 0, 0)
            } else if minor > 0 {
                upper(0, bump(minor)?, 0)
            } else {
                upper(0, 0, bump(patch)?)
            };
            vec![
                Comparator::new(Op::Ge, with_pre(version(major, minor, patch), &p.pre)),
                Comparator::new(Op::Lt, ceiling),
            ]
        }
    };
    Ok(set)
}

fn tilde(p: &Partial, options: RangeOptions) -> std::result::Result<ComparatorSet, String> {
    let Some(major) = p.major else {
        return Ok(ComparatorSet::new());
    };

    let set = match (p.minor, p.patch) {
        (None, _) => vec![
            Comparator::new(Op::Ge, lower(major, 0, 0, options)),
            Comparator::new(Op::Lt, upper(bump(major)?, 0, 0)),
        ],
        (Some(minor), None) => vec![
            Comparator::new(Op::Ge, lower(major, minor, 0, options)),
            Comparator::new(Op::Lt, upper(major, bump(minor)?, 0)),
        ],
        (Some(minor), Some(patch)) => vec![
            Comparator::new(Op::Ge, with_pre(version(major, minor, patch), &p.pre)),
            Comparator::new(Op::Lt, upper(major, bump(minor)?, 0)),
        ],
    };
    Ok(set)
}

/// 比较运算符与通配范围
fn primitive(
    op: Option<Op>,
    p: &Partial,
    options: RangeOptions,
) -> std::result::Result<ComparatorSet, String> {
    let Some(major) = p.major else {
        return Ok(match op {
            Some(Op::Lt) | Some(Op::Gt) => nothing(),
            _ => ComparatorSet::new(),
        });
    };

    let (Some(minor), Some(patch)) = (p.minor, p.patch) else {
        // 部分版本
        return Ok(match op {
            None | Some(Op::Eq) => match p.minor {
                None => vec![
                    Comparator::new(Op::Ge, lower(major, 0, 0, options)),
                    Comparator::new(Op::Lt, upper(bump(major)?, 0, 0)),
                ],
                Some(minor) => vec![
                    Comparator::new(Op::Ge, lower(major, minor, 0, options)),
                    Comparator::new(Op::Lt, upper(major, bump(minor)?, 0)),
                ],
            },
            // >1 即 >=2.0.0，>1.2 即 >=1.3.0
            Some(Op::Gt) => {
                let floor = match p.minor {
                    None => version(bump(major)?, 0, 0),
                    Some(minor) => version(major, bump(minor)?, 0),
                };
                vec![Comparator::new(Op::Ge, floor)]
            }
            // <=1 即 <2.0.0-0，<=1.2 即 <1.3.0-0
            Some(Op::Le) => {
                let ceiling = match p.minor {
                    None => upper(bump(major)?, 0, 0),
                    Some(minor) => upper(major, bump(minor)?, 0),
                };
                vec![Comparator::new(Op::Lt, ceiling)]
            }
            Some(Op::Lt) => vec![Comparator::new(
                Op::Lt,
                upper(major, p.minor.unwrap_or(0), 0),
            )],
            Some(Op::Ge) => vec![Comparator::new(
                Op::Ge,
                version(major, p.minor.unwrap_or(0), 0),
            )],
        });
    };

    let exact = with_pre(version(major, minor, patch), &p.pre);
    Ok(vec![Comparator::new(op.unwrap_or(Op::Eq), exact)])
}

fn hyphen(from: &str, to: &str, options: RangeOptions) -> std::result::Result<ComparatorSet, String> {
    let from = Partial::parse(from)?;
    let to = Partial::parse(to)?;
    let mut set = ComparatorSet::new();

    if let Some(major) = from.major {
        let floor = match (from.minor, from.patch) {
            (None, _) => lower(major, 0, 0, options),
            (Some(minor), None) => lower(major, minor, 0, options),
            (Some(minor), Some(patch)) if !from.pre.is_empty() => {
                with_pre(version(major, minor, patch), &from.pre)
            }
            (Some(minor), Some(patch)) => lower(major, minor, patch, options),
        };
        set.push(Comparator::new(Op::Ge, floor));
    }

    if let Some(major) = to.major {
        let ceiling = match (to.minor, to.patch) {
            (None, _) => Comparator::new(Op::Lt, upper(bump(major)?, 0, 0)),
            (Some(minor), None) => Comparator::new(Op::Lt, upper(major, bump(minor)?, 0)),
            (Some(minor), Some(patch)) if !to.pre.is_empty() => {
                Comparator::new(Op::Le, with_pre(version(major, minor, patch), &to.pre))
            }
            (Some(minor), Some(patch)) if options.include_prerelease => {
                Comparator::new(Op::Lt, upper(major, minor, bump(patch)?))
            }
            (Some(minor), Some(patch)) => Comparator::new(Op::Le, version(major, minor, patch)),
        };
        set.push(ceiling);
    }

    Ok(set)
}
