use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rules5e::{
    dice, Ability, AbilityScores, CheckInput, Dice, DiceSpec, DiceTables, EncounterOptions,
    GenerationMethod, ProficiencyLevel, SkillOrSave,
};

#[derive(Copy, Clone, ValueEnum)]
enum ScoreMethod {
    /// 15, 14, 13, 12, 10, 8
    StandardArray,
    /// 4d6, drop the lowest
    Roll,
    /// 3d6+6
    Heroic,
}

#[derive(Copy, Clone, ValueEnum)]
enum Prof {
    None,
    Proficient,
    Expert,
}

impl From<Prof> for ProficiencyLevel {
    fn from(p: Prof) -> Self {
        match p {
            Prof::None => ProficiencyLevel::None,
            Prof::Proficient => ProficiencyLevel::Proficient,
            Prof::Expert => ProficiencyLevel::Expert,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll dice notation (e.g. 2d6+3) under a named roll modifier
    Roll {
        /// Dice notation, or a table name like d20
        notation: String,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Roll modifier from the dice tables (normal, advantage, ...)
        #[arg(long, default_value = "normal")]
        adv: String,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        rolls: u32,
        /// Alternative dice tables YAML
        #[arg(long)]
        tables: Option<PathBuf>,
    },
    /// Perform a check against a DC using a modifier and (dis)advantage
    Check {
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Roll modifier from the dice tables
        #[arg(long, default_value = "normal")]
        adv: String,
        /// Difficulty Class to beat (>=)
        #[arg(long)]
        dc: i32,
        /// Ability/skill modifier to add to the d20
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        modifier: i32,
    },
    /// Total bonus for a skill or save on one ability score
    Bonus {
        #[arg(long)]
        score: i32,
        #[arg(long, default_value_t = 1)]
        level: u8,
        #[arg(long, value_enum, default_value_t = Prof::None)]
        proficiency: Prof,
        /// Active penalty magnitude applied through the "armor" tag
        #[arg(long, default_value_t = 0)]
        penalty: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        situational: i32,
    },
    /// Generate a set of ability scores and show their point-buy cost
    Abilities {
        #[arg(long, value_enum, default_value_t = ScoreMethod::StandardArray)]
        method: ScoreMethod,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Autoplay an encounter between builtin combatants and print the log
    Encounter {
        #[arg(long, value_delimiter = ',', default_value = "fighter")]
        party: Vec<String>,
        #[arg(long, value_delimiter = ',', default_value = "goblin,goblin")]
        foes: Vec<String>,
        /// Extra party member loaded from a combatant JSON file
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long, default_value_t = 20)]
        max_rounds: u32,
        /// Print the final state as a JSON snapshot
        #[arg(long, default_value_t = false)]
        snapshot: bool,
        /// One JSON object per log event instead of text lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Parser)]
#[command(name = "rules5e-cli")]
#[command(about = "Rules engine CLI harness")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

fn tables(path: Option<&PathBuf>) -> anyhow::Result<DiceTables> {
    match path {
        Some(p) => DiceTables::load(p),
        None => Ok(DiceTables::default()),
    }
}

fn parse_notation(text: &str, tables: &DiceTables) -> anyhow::Result<DiceSpec> {
    if let Ok(sides) = tables.sides(text) {
        return Ok(DiceSpec::new(1, sides, 0)?);
    }
    Ok(DiceSpec::parse(text)?)
}

fn main() -> anyhow::Result<()> {
    cli::init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Roll {
            notation,
            seed,
            adv,
            rolls,
            tables: path,
        } => {
            let tables = tables(path.as_ref())?;
            let spec = parse_notation(&notation, &tables)?;
            let strategy = tables.strategy(&adv)?;
            let mut dice = Dice::from_seed(seed);
            for _ in 0..rolls {
                let r = dice::roll(spec, strategy, &mut dice)?;
                let raw = r
                    .rolls
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                println!("{spec} [{raw}] keep={} total={}", r.chosen_value, r.total);
            }
        }
        Cmd::Check {
            seed,
            adv,
            dc,
            modifier,
        } => {
            let strategy = DiceTables::default().strategy(&adv)?;
            let mut dice = Dice::from_seed(seed);
            let res = dice::check(
                &mut dice,
                CheckInput {
                    dc,
                    modifier,
                    strategy,
                },
            )?;
            println!(
                "roll={} mod={} total={} dc={} => {}",
                res.roll.chosen_value,
                modifier,
                res.total,
                res.dc,
                if res.passed { "SUCCESS" } else { "FAIL" }
            );
        }
        Cmd::Bonus {
            score,
            level,
            proficiency,
            penalty,
            situational,
        } => {
            let mut scores = AbilityScores::default();
            scores.set(Ability::Str, score)?;
            let mut entry = SkillOrSave::for_save(Ability::Str, proficiency.into())
                .with_situational(situational);
            entry.penalty_tags.push("armor".into());
            let penalties = [("armor".to_string(), penalty)].into_iter().collect();
            let total = rules5e::total_bonus(&scores, &entry, level, &penalties)?;
            println!("bonus={total:+}");
        }
        Cmd::Abilities { method, seed } => {
            let mut dice = Dice::from_seed(seed);
            let scores = match method {
                ScoreMethod::StandardArray => AbilityScores::standard_array(),
                ScoreMethod::Roll => {
                    rules5e::roll_ability_scores(GenerationMethod::FourDropLowest, &mut dice)?
                }
                ScoreMethod::Heroic => {
                    rules5e::roll_ability_scores(GenerationMethod::Heroic, &mut dice)?
                }
            };
            for ability in Ability::ALL {
                println!(
                    "{ability} {:>2} ({:+})",
                    scores.score(ability),
                    scores.mod_of(ability)
                );
            }
            match rules5e::point_buy_cost(&scores) {
                Ok(cost) => println!("point-buy cost={cost}"),
                Err(err) => println!("point-buy cost=n/a ({err})"),
            }
        }
        Cmd::Encounter {
            party,
            foes,
            file,
            seed,
            max_rounds,
            snapshot,
            json,
        } => {
            let mut roster = cli::roster(&party, &foes)?;
            if let Some(path) = file {
                roster.push(cli::load_combatant_file(&path, "custom")?);
            }
            let options = EncounterOptions {
                max_rounds,
                ..EncounterOptions::default()
            };
            let mut dice = Dice::from_seed(seed);
            let mut enc = rules5e::start_encounter(roster, options, &mut dice)?;
            let max_steps = max_rounds as usize * enc.turn_order().len() * 3 + 1;
            cli::autoplay(&mut enc, &mut dice, max_steps)?;
            for event in &enc.current_state().log {
                if json {
                    println!("{}", serde_json::to_string(event)?);
                } else {
                    println!("{event}");
                }
            }
            if snapshot {
                println!("{}", enc.snapshot().to_json()?);
            }
        }
    }
    Ok(())
}
