//! Regen MOS CLI - Run a strategy search from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;

use regen_mos::{
    compute::{StochasticSimulator, crowded_cmp, evolve_with_callback},
    schema::{ContractType, EvolutionConfig, FieldState},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.get(1).is_some_and(|a| a == "--example") {
        print_example_config();
        return;
    }
    if args.get(1).is_some_and(|a| a == "--help" || a == "-h") {
        print_usage(&args[0]);
        return;
    }

    let config = match args.get(1) {
        Some(path) => EvolutionConfig::from_json_file(PathBuf::from(path)).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }),
        None => EvolutionConfig::default(),
    };

    let contract: ContractType = match args.get(2) {
        Some(name) => serde_json::from_value(serde_json::Value::String(name.clone()))
            .unwrap_or_else(|e| {
                eprintln!("Unknown contract type '{}': {}", name, e);
                std::process::exit(1);
            }),
        None => ContractType::default(),
    };

    let field = match args.get(3) {
        Some(path) => load_field(path),
        None => FieldState::default(),
    };

    if let Err(e) = config.validate_for(&field) {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    println!("Regen MOS Strategy Search");
    println!("=========================");
    println!("Contract: {:?}", contract);
    println!("Field: '{}' (sri {:.3}, {} genes)", field.field_id, field.sri, field.genes.len());
    println!(
        "Population: {} x {} generations (deadline {}ms)",
        config.population_size, config.generations, config.deadline_ms
    );
    println!();

    let report_every = (config.generations / 10).max(1);
    let result = evolve_with_callback(&field, contract, &config, &StochasticSimulator, |p| {
        if (p.generation + 1) % report_every == 0 {
            println!(
                "  Generation {}/{}: {} fronts, {} non-dominated, {} feasible, {}ms",
                p.generation + 1,
                p.total_generations,
                p.front_count,
                p.first_front_size,
                p.feasible_count,
                p.elapsed_ms
            );
        }
    });

    let stats = &result.stats;
    println!();
    println!(
        "Stopped: {:?} after {} generations, {} evaluations, {}ms",
        stats.stop_reason, stats.generations_completed, stats.evaluations, stats.elapsed_ms
    );
    if !stats.evaluated {
        println!("Warning: returned population has not been evaluated");
    }

    let mut ranked: Vec<_> = result.population.iter().collect();
    ranked.sort_by(|a, b| crowded_cmp(a, b));

    println!();
    println!("Top strategies:");
    for strategy in ranked.iter().take(5) {
        let genes: Vec<String> = strategy
            .genome
            .genes
            .iter()
            .map(|(k, v)| format!("{}={:.3}", k, v))
            .collect();
        println!(
            "  #{} rank={:?} efficiency={:.4} regeneration={:.4} cv={:.4} [{}]",
            strategy.id,
            strategy.rank,
            strategy.objective(0),
            strategy.objective(1),
            strategy.objectives.constraint_violation,
            genes.join(", ")
        );
    }
}

fn load_field(path: &str) -> FieldState {
    let raw = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading field file: {}", e);
        std::process::exit(1);
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        eprintln!("Error parsing field: {}", e);
        std::process::exit(1);
    })
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [config.json] [contract] [field.json]", program);
    eprintln!();
    eprintln!("Run a multi-objective strategy search with the stochastic simulator.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json  Evolution configuration (default: built-in)");
    eprintln!("  contract     SEASONAL_OPTIMIZATION | MULTI_YEAR_ADVISORY | MANAGED_REGENERATIVE");
    eprintln!("  field.json   Field state with gene bounds (default: built-in)");
    eprintln!();
    eprintln!("Example configuration is printed with the --example flag.");
}

fn print_example_config() {
    let config = EvolutionConfig::default();
    let field = FieldState::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
    println!();
    println!("Example field (field.json):");
    match serde_json::to_string_pretty(&field) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing field: {}", e),
    }
}
