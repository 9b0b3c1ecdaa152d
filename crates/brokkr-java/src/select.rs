//! Runtime selection
//!
//! A fixed ordered table of compatibility rules, each mandatory or advisory,
//! is evaluated per candidate. Two running bests are kept: the best
//! candidate violating no mandatory rule, and the best violating no rule at
//! all. The advisory-clean best wins; the mandatory-clean best is the
//! fallback when every candidate trips some advisory rule.
//!
//! Tie-break between two otherwise acceptable candidates: when their major
//! versions differ the lower major wins, and within a major the higher full
//! version wins.

use brokkr_core::{Architecture, HostInfo, OperatingSystem, VersionNumber};

use crate::runtime::JavaRuntime;

const MIN: &str = "0";
const MAX: &str = "10000";

/// Traits of the version being launched that affect runtime choice
#[derive(Debug, Clone, Default)]
pub struct Workload {
    /// Forge patch version, when the version uses Forge
    pub forge_patch_version: Option<VersionNumber>,
    /// LaunchWrapper library version, when the version boots through it
    pub launch_wrapper_version: Option<VersionNumber>,
    /// Java major release declared by the version's own metadata
    pub declared_java_major: Option<u32>,
}

/// Inputs to one selection run
#[derive(Debug, Clone)]
pub struct SelectionContext<'a> {
    pub host: &'a HostInfo,
    pub game_version: Option<VersionNumber>,
    pub workload: Workload,
}

impl<'a> SelectionContext<'a> {
    pub fn new(host: &'a HostInfo, game_version: Option<VersionNumber>) -> Self {
        Self {
            host,
            game_version,
            workload: Workload::default(),
        }
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = workload;
        self
    }
}

type Predicate = fn(&SelectionContext, &JavaRuntime) -> bool;

struct ConstraintRule {
    name: &'static str,
    mandatory: bool,
    /// Inclusive game-version range; the rule never applies when the game
    /// version is unknown
    game: (&'static str, &'static str),
    /// Inclusive runtime-version range the default check tests against
    java: (&'static str, &'static str),
    applies: Option<Predicate>,
    check: Option<Predicate>,
}

impl ConstraintRule {
    fn applies(&self, ctx: &SelectionContext, java: &JavaRuntime) -> bool {
        let Some(game) = &ctx.game_version else {
            return false;
        };
        if !in_range(game, self.game) {
            return false;
        }
        self.applies.is_none_or(|applies| applies(ctx, java))
    }

    fn check(&self, ctx: &SelectionContext, java: &JavaRuntime) -> bool {
        match self.check {
            Some(check) => check(ctx, java),
            None => in_range(&java.version_number(), self.java),
        }
    }
}

fn in_range(version: &VersionNumber, (lo, hi): (&str, &str)) -> bool {
    *version >= VersionNumber::new(lo) && *version <= VersionNumber::new(hi)
}

const CONSTRAINTS: &[ConstraintRule] = &[
    // 1.17 bumped the class-file level to Java 16, 1.18 to 17
    ConstraintRule {
        name: "vanilla-java-16",
        mandatory: true,
        game: ("1.17", MAX),
        java: ("16", MAX),
        applies: None,
        check: None,
    },
    ConstraintRule {
        name: "vanilla-java-17",
        mandatory: true,
        game: ("1.18", MAX),
        java: ("17", MAX),
        applies: None,
        check: None,
    },
    // Forge [37.0.0, 37.0.60) on 1.17.1 crashes on Java 17
    ConstraintRule {
        name: "modded-java-16",
        mandatory: false,
        game: ("1.17.1", "1.17.1"),
        java: ("16", "16.999"),
        applies: Some(|ctx, _| {
            ctx.workload
                .forge_patch_version
                .as_ref()
                .is_some_and(|forge| *forge < VersionNumber::new("37.0.60"))
        }),
        check: None,
    },
    ConstraintRule {
        name: "vanilla-java-8",
        mandatory: true,
        game: ("1.13", MAX),
        java: ("1.8", MAX),
        applies: None,
        check: None,
    },
    ConstraintRule {
        name: "modded-java-8",
        mandatory: false,
        game: ("1.7.10", MAX),
        java: ("1.8", MAX),
        applies: None,
        check: None,
    },
    // Forge on <=1.7.2 wants Java 7; the legacy fixer usually copes, so
    // only advise
    ConstraintRule {
        name: "modded-java-7",
        mandatory: false,
        game: (MIN, "1.7.2"),
        java: (MIN, "1.7.999"),
        applies: Some(|ctx, _| ctx.workload.forge_patch_version.is_some()),
        check: None,
    },
    // LaunchWrapper <1.13 casts the system class loader to URLClassLoader
    ConstraintRule {
        name: "launch-wrapper",
        mandatory: true,
        game: (MIN, "1.12.999"),
        java: (MIN, "1.8.999"),
        applies: Some(|ctx, _| {
            ctx.workload
                .launch_wrapper_version
                .as_ref()
                .is_some_and(|wrapper| *wrapper < VersionNumber::new("1.13"))
        }),
        check: None,
    },
    // world generation on 1.13+ may crash on Java [1.8, 1.8.0_51)
    ConstraintRule {
        name: "vanilla-java-8u51",
        mandatory: false,
        game: ("1.13", MAX),
        java: ("1.8.0_51", MAX),
        applies: None,
        check: None,
    },
    // the major version declared by the version metadata is binding; below
    // 1.7.10 that metadata is known to be wrong, so it is ignored there
    ConstraintRule {
        name: "declared-java",
        mandatory: true,
        game: ("1.7.10", MAX),
        java: (MIN, MAX),
        applies: Some(|ctx, _| ctx.workload.declared_java_major.is_some()),
        check: Some(|ctx, java| {
            let Some(major) = ctx.workload.declared_java_major else {
                return true;
            };
            let floor = if major >= 9 {
                major.to_string()
            } else {
                format!("1.{major}")
            };
            java.version_number() >= VersionNumber::new(floor)
        }),
    },
    // 64-bit JDK 9+ on Linux refuses the 32-bit lwjgl natives of <=1.12.2
    ConstraintRule {
        name: "vanilla-linux-java-8",
        mandatory: true,
        game: (MIN, "1.12.999"),
        java: (MIN, "1.8.999"),
        applies: Some(|ctx, java| {
            ctx.host.os() == OperatingSystem::Linux
                && ctx.host.arch() == Architecture::X86_64
                && java.platform().arch == Architecture::X86_64
        }),
        check: None,
    },
    // no official arm64 support before 1.6; advise an x86 runtime there
    ConstraintRule {
        name: "vanilla-x86",
        mandatory: false,
        game: (MIN, MAX),
        java: (MIN, MAX),
        applies: Some(|ctx, java| {
            java.platform().arch == Architecture::Arm64
                && matches!(
                    ctx.host.os(),
                    OperatingSystem::Windows | OperatingSystem::MacOS
                )
                && ctx
                    .game_version
                    .as_ref()
                    .is_some_and(|game| *game < VersionNumber::new("1.6"))
        }),
        check: Some(|_, java| java.platform().arch.is_x86()),
    },
    // JDK-8273826 breaks ModLauncher on specific runtime point releases
    ConstraintRule {
        name: "modlauncher-8",
        mandatory: false,
        game: ("1.16.3", "1.17.1"),
        java: (MIN, MAX),
        applies: Some(|ctx, _| {
            let Some(game) = &ctx.game_version else {
                return false;
            };
            let Some(forge) = &ctx.workload.forge_patch_version else {
                return false;
            };
            match game.as_str() {
                "1.16.3" => *forge >= VersionNumber::new("34.1.27"),
                "1.16.4" => true,
                "1.16.5" => *forge <= VersionNumber::new("36.2.23"),
                "1.17.1" => {
                    *forge >= VersionNumber::new("37.0.60")
                        && *forge <= VersionNumber::new("37.0.75")
                }
                _ => false,
            }
        }),
        check: Some(|_, java| {
            let Some(major) = java.major_version() else {
                return true;
            };
            let version = java.version_number();
            match major {
                major if major > 17 => false,
                8 => version < VersionNumber::new("1.8.0_321"),
                11 => version < VersionNumber::new("11.0.14"),
                15 => version < VersionNumber::new("15.0.6"),
                17 => version < VersionNumber::new("17.0.2"),
                _ => true,
            }
        }),
    },
];

/// Pick the best runtime for a selection context, or `None` when no
/// candidate passes the architecture filter and every mandatory rule
pub fn select_java<'a, I>(runtimes: I, ctx: &SelectionContext) -> Option<&'a JavaRuntime>
where
    I: IntoIterator<Item = &'a JavaRuntime>,
{
    // an unknown game version is treated like a pre-1.6 one here
    let force_x86 = ctx.host.arch() == Architecture::Arm64
        && matches!(
            ctx.host.os(),
            OperatingSystem::Windows | OperatingSystem::MacOS
        )
        && ctx
            .game_version
            .as_ref()
            .is_none_or(|game| *game < VersionNumber::new("1.6"));

    let mut mandatory_best: Option<&JavaRuntime> = None;
    let mut suggested_best: Option<&JavaRuntime> = None;

    for java in runtimes {
        let arch = java.platform().arch;
        if force_x86 {
            if !arch.is_x86() {
                continue;
            }
        } else if arch != ctx.host.arch() {
            continue;
        }

        let mut mandatory_ok = true;
        let mut suggested_ok = true;
        for rule in CONSTRAINTS {
            if rule.applies(ctx, java) && !rule.check(ctx, java) {
                suggested_ok = false;
                if rule.mandatory {
                    mandatory_ok = false;
                    break;
                }
            }
        }
        if mandatory_ok {
            mandatory_best = Some(prefer(mandatory_best, java));
            if suggested_ok {
                suggested_best = Some(prefer(suggested_best, java));
            }
        }
    }

    suggested_best.or(mandatory_best)
}

/// The literal tie-break: lower major wins when majors differ, higher full
/// version wins within a major. A known major always beats an unknown one.
fn prefer<'a>(best: Option<&'a JavaRuntime>, candidate: &'a JavaRuntime) -> &'a JavaRuntime {
    let Some(best) = best else {
        return candidate;
    };
    match (best.major_version(), candidate.major_version()) {
        (Some(a), Some(b)) if a != b => {
            if a < b {
                best
            } else {
                candidate
            }
        }
        (Some(_), None) => best,
        (None, Some(_)) => candidate,
        _ => {
            if candidate.version_number() > best.version_number() {
                candidate
            } else {
                best
            }
        }
    }
}
