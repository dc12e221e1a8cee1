//! Headless симуляция DRIFTGRID
//!
//! Генерирует демо-сектор и прогоняет 1000 тиков без рендера

use driftgrid_simulation::{
    create_simulation_app, load_sector, run_simulation_tick, GridStats, SectorConfig, SimulationConfig,
    StationModule,
};
use driftgrid_simulation::sector::StationConfig;

fn main() {
    let config = SimulationConfig::default();
    println!("Starting DRIFTGRID headless simulation (seed: {})", config.seed);

    let mut app = create_simulation_app(config);

    let sector = SectorConfig {
        side_length: 20.0,
        side_nodes: 20,
        stations: vec![StationConfig {
            position: [4.0, 3.0, 0.0],
            modules: vec![
                StationModule::node_puller(2.0, 0.05, 0.02, 0.5),
                StationModule::sphere_collider(1.0, 0.5),
            ],
        }],
        ..Default::default()
    };

    if let Err(error) = load_sector(app.world_mut(), &sector) {
        eprintln!("Invalid sector config: {}", error);
        std::process::exit(1);
    }

    for tick in 0..1000 {
        run_simulation_tick(&mut app);

        if tick % 100 == 0 {
            let stats = *app.world().resource::<GridStats>();
            println!(
                "Tick {}: {} nodes, {} connections, {} splits, {} culled",
                tick, stats.nodes, stats.connections, stats.splits, stats.culled
            );
        }
    }

    println!("Simulation complete!");
}
