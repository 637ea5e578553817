use std::path::PathBuf;

use clap::Parser;
use rules5e::combat::CombatEvent;
use rules5e::{Dice, EncounterOptions, Side};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "simulate-vs")]
#[command(about = "Monte Carlo sim: many autoplayed fights against builtin foes")]
struct Args {
    /// Builtin foe names, comma separated
    #[arg(long, value_delimiter = ',', default_value = "goblin")]
    foe: Vec<String>,

    /// Builtin party names, comma separated
    #[arg(long, value_delimiter = ',', default_value = "fighter")]
    party: Vec<String>,

    /// Party member from a combatant JSON file instead of builtins
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Safety cap on rounds per trial
    #[arg(long, default_value_t = 20)]
    max_rounds: u32,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Print the summary as JSON instead of the text table
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct Summary {
    trials: u32,
    party: Vec<String>,
    foes: Vec<String>,
    win_rate: f64,
    loss_rate: f64,
    draws: u32,
    hit_rate: f64,
    crit_rate: f64,
    avg_dmg_per_hit: f64,
    avg_rounds_wins: f64,
    median_rounds: u32,
}

#[derive(Default)]
struct Tally {
    wins: u32,
    losses: u32,
    draws: u32,
    hits: u32,
    misses: u32,
    crits: u32,
    dmg_on_hits: i64,
    win_rounds: Vec<u32>,
}

impl Tally {
    fn record_attacks(&mut self, events: &[CombatEvent]) {
        for e in events {
            if let CombatEvent::Attack(a) = e {
                if a.hit {
                    self.hits += 1;
                    self.dmg_on_hits += i64::from(a.damage);
                    if a.critical {
                        self.crits += 1;
                    }
                } else {
                    self.misses += 1;
                }
            }
        }
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        f64::from(num) / f64::from(den)
    }
}

fn median(sorted: &[u32]) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let m = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[m]
    } else {
        (sorted[m - 1] + sorted[m]) / 2
    }
}

fn main() -> anyhow::Result<()> {
    cli::init_tracing();
    let args = Args::parse();

    let options = EncounterOptions {
        max_rounds: args.max_rounds,
        ..EncounterOptions::default()
    };

    let party = match &args.file {
        Some(path) => vec![cli::load_combatant_file(path, "custom")?],
        None => cli::side(&args.party, Side::Party)?,
    };
    let party_names: Vec<String> = party.iter().map(|c| c.name.clone()).collect();

    let mut tally = Tally::default();
    for i in 0..args.trials {
        let mut roster = party.clone();
        roster.extend(cli::side(&args.foe, Side::Foes)?);

        let mut dice = Dice::from_seed(args.seed.wrapping_add(u64::from(i)));
        let mut enc = rules5e::start_encounter(roster, options, &mut dice)?;
        let max_steps = args.max_rounds as usize * enc.turn_order().len() * 3 + 1;
        let events = cli::autoplay(&mut enc, &mut dice, max_steps)?;
        tally.record_attacks(&events);

        match enc.result().and_then(|r| r.winner.map(|w| (w, r.rounds))) {
            Some((Side::Party, rounds)) => {
                tally.wins += 1;
                tally.win_rounds.push(rounds);
            }
            Some((Side::Foes, _)) => tally.losses += 1,
            None => tally.draws += 1,
        }
    }

    tally.win_rounds.sort_unstable();
    let avg_rounds = if tally.win_rounds.is_empty() {
        0.0
    } else {
        tally.win_rounds.iter().map(|&r| f64::from(r)).sum::<f64>() / tally.win_rounds.len() as f64
    };
    let avg_dmg = if tally.hits == 0 {
        0.0
    } else {
        tally.dmg_on_hits as f64 / f64::from(tally.hits)
    };

    let summary = Summary {
        trials: args.trials,
        party: party_names,
        foes: args.foe.clone(),
        win_rate: ratio(tally.wins, args.trials),
        loss_rate: ratio(tally.losses, args.trials),
        draws: tally.draws,
        hit_rate: ratio(tally.hits, tally.hits + tally.misses),
        crit_rate: ratio(tally.crits, tally.hits),
        avg_dmg_per_hit: avg_dmg,
        avg_rounds_wins: avg_rounds,
        median_rounds: median(&tally.win_rounds),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("simulate-vs results");
    println!("-------------------");
    println!("trials:             {}", summary.trials);
    println!("party:              {}", summary.party.join(","));
    println!("foes:               {}", summary.foes.join(","));
    println!();
    println!("win rate:           {:.1}%", summary.win_rate * 100.0);
    println!("loss rate:          {:.1}%", summary.loss_rate * 100.0);
    println!("draws:              {}", summary.draws);
    println!("hit rate:           {:.1}%", summary.hit_rate * 100.0);
    println!("crit rate:          {:.1}%", summary.crit_rate * 100.0);
    println!("avg dmg per hit:    {:.2}", summary.avg_dmg_per_hit);
    println!("avg rounds (wins):  {:.2}", summary.avg_rounds_wins);
    println!("median rounds:      {}", summary.median_rounds);

    Ok(())
}
