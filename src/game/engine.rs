use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::{debug, info};

use super::{
    action::{Direction, Player},
    config::GameConfig,
    error::GameError,
    state::{Apple, CollisionType, MoveOutcome, Position, Snake},
};

/// Direction a player is travelling in and the one they asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Steering {
    current: Direction,
    next: Direction,
}

impl Steering {
    fn new(direction: Direction) -> Self {
        Self {
            current: direction,
            next: direction,
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Players that ate the apple, in the order they ate
    pub eaten: Vec<Player>,
    /// Snakes that died this tick and the first rule that killed them
    pub deaths: Vec<(Player, CollisionType)>,
}

/// How a finished round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Player),
    Draw,
}

/// Two snakes, one apple, advanced one tick at a time
pub struct Game<R = ThreadRng> {
    config: GameConfig,
    snakes: [Snake; 2],
    steering: [Steering; 2],
    apple: Apple,
    ticks: u64,
    rng: R,
}

impl Game<ThreadRng> {
    pub fn new(config: GameConfig) -> Self {
        Game::with_rng(config, rand::thread_rng())
    }
}

impl<R: Rng> Game<R> {
    pub fn with_rng(config: GameConfig, mut rng: R) -> Self {
        let snakes = [
            Snake::new(config.spawn_a, config.initial_snake_length),
            Snake::new(config.spawn_b, config.initial_snake_length),
        ];
        let apple = Apple::random(&mut rng, config.apple_max);

        Self {
            config,
            snakes,
            steering: [Steering::new(Direction::Right); 2],
            apple,
            ticks: 0,
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn snake(&self, player: Player) -> &Snake {
        &self.snakes[player.index()]
    }

    pub fn apple(&self) -> &Apple {
        &self.apple
    }

    pub fn direction(&self, player: Player) -> Direction {
        self.steering[player.index()].current
    }

    pub fn next_direction(&self, player: Player) -> Direction {
        self.steering[player.index()].next
    }

    /// Completed ticks since the round started
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// True once either snake is dead
    pub fn is_over(&self) -> bool {
        self.snakes.iter().any(Snake::is_dead)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match (self.snakes[0].is_dead(), self.snakes[1].is_dead()) {
            (false, false) => None,
            (true, true) => Some(Outcome::Draw),
            (false, true) => Some(Outcome::Winner(Player::A)),
            (true, false) => Some(Outcome::Winner(Player::B)),
        }
    }

    /// Request a turn for the next tick.
    ///
    /// A request pointing straight back along the player's current direction
    /// is dropped. Otherwise it replaces any earlier request made since the
    /// last tick. Returns whether the request was accepted.
    pub fn on_key_press(&mut self, player: Player, direction: Direction) -> bool {
        let steering = &mut self.steering[player.index()];
        if direction.is_opposite(steering.current) {
            return false;
        }
        steering.next = direction;
        true
    }

    /// Run one tick.
    ///
    /// Rules are applied in a fixed order: movement, head clash, walls,
    /// apple, body clash. A rule can kill a snake an earlier one spared but
    /// nothing brings a snake back.
    pub fn advance(&mut self) -> Result<TickReport, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }

        let mut report = TickReport::default();

        // Movement
        for player in Player::BOTH {
            let i = player.index();
            let steering = &mut self.steering[i];
            steering.current = steering.next;
            if let MoveOutcome::Crashed(cause) = self.snakes[i].move_towards(steering.current)? {
                Self::record_death(&mut report, player, cause);
            }
        }

        // Head clash
        if self.snakes[0].head() == self.snakes[1].head() {
            for player in Player::BOTH {
                self.kill(&mut report, player, CollisionType::HeadToHead);
            }
        }

        // Walls
        if self.hits_wall_a(self.snakes[0].head()) {
            self.kill(&mut report, Player::A, CollisionType::Wall);
        }
        if self.hits_wall_b(self.snakes[1].head()) {
            self.kill(&mut report, Player::B, CollisionType::Wall);
        }

        // Apple. B compares against whatever apple A left behind.
        for player in Player::BOTH {
            let snake = &mut self.snakes[player.index()];
            if snake.is_dead() || snake.head() != self.apple.position() {
                continue;
            }
            snake.grow()?;
            self.apple = Apple::random(&mut self.rng, self.config.apple_max);
            report.eaten.push(player);
            debug!(%player, apple = ?self.apple.position(), "apple eaten");
        }

        // Body clash
        let (a, b) = (&self.snakes[0], &self.snakes[1]);
        let clash = a.body_segments().contains(&a.head())
            || b.body_segments().contains(&a.head())
            || b.body_segments().contains(&b.head())
            || a.body_segments().contains(&b.head());
        if clash {
            for player in Player::BOTH {
                self.kill(&mut report, player, CollisionType::Body);
            }
        }

        self.ticks += 1;

        if let Some(outcome) = self.outcome() {
            info!(ticks = self.ticks, ?outcome, "round over");
        }

        Ok(report)
    }

    // Player A dies on the last row/column and on -1.
    fn hits_wall_a(&self, head: Position) -> bool {
        let (rows, cols) = self.bounds();
        head.row >= rows - 1 || head.row == -1 || head.col >= cols - 1 || head.col == -1
    }

    // Player B dies on row/column 0 as well as on the last row/column.
    fn hits_wall_b(&self, head: Position) -> bool {
        let (rows, cols) = self.bounds();
        head.row == 0 || head.row >= rows - 1 || head.col == 0 || head.col >= cols - 1
    }

    fn bounds(&self) -> (i32, i32) {
        let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        (clamp(self.config.grid_height), clamp(self.config.grid_width))
    }

    fn kill(&mut self, report: &mut TickReport, player: Player, cause: CollisionType) {
        let snake = &mut self.snakes[player.index()];
        if !snake.is_dead() {
            snake.kill();
            Self::record_death(report, player, cause);
        }
    }

    fn record_death(report: &mut TickReport, player: Player, cause: CollisionType) {
        info!(%player, ?cause, "snake died");
        report.deaths.push((player, cause));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seeded(config: GameConfig) -> Game<StdRng> {
        let mut game = Game::with_rng(config, StdRng::seed_from_u64(42));
        // Keep the apple out of the way unless a test places it
        game.apple = Apple::new(Position::new(38, 38));
        game
    }

    fn roomy() -> GameConfig {
        GameConfig::new(40, 40)
    }

    #[test]
    fn test_new_game() {
        let game = Game::new(GameConfig::default());

        assert!(!game.is_over());
        assert_eq!(game.outcome(), None);
        assert_eq!(game.ticks(), 0);
        assert_eq!(game.snake(Player::A).head(), Position::new(0, 0));
        assert_eq!(game.snake(Player::B).head(), Position::new(10, 0));
        assert_eq!(game.snake(Player::A).pending_growth(), 4);
        for player in Player::BOTH {
            assert_eq!(game.direction(player), Direction::Right);
            assert_eq!(game.next_direction(player), Direction::Right);
        }

        let apple = game.apple().position();
        assert!((0..=20).contains(&apple.row));
        assert!((0..=20).contains(&apple.col));
    }

    #[test]
    fn test_four_ticks_unroll_snake() {
        let mut game = seeded(GameConfig::default());

        for _ in 0..4 {
            let report = game.advance().unwrap();
            assert!(report.deaths.is_empty());
        }

        let snake = game.snake(Player::A);
        assert_eq!(snake.head(), Position::new(0, 4));
        assert_eq!(snake.len(), 5);
        assert!(!snake.is_dead());
        assert_eq!(game.ticks(), 4);
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut game = seeded(roomy());

        assert!(!game.on_key_press(Player::A, Direction::Left));
        assert_eq!(game.next_direction(Player::A), Direction::Right);

        assert!(game.on_key_press(Player::A, Direction::Up));
        assert_eq!(game.next_direction(Player::A), Direction::Up);

        assert!(game.on_key_press(Player::A, Direction::Down));
        assert_eq!(game.next_direction(Player::A), Direction::Down);

        // Player B is steered independently
        assert_eq!(game.next_direction(Player::B), Direction::Right);
    }

    #[test]
    fn test_guard_uses_current_direction() {
        let mut game = seeded(GameConfig {
            spawn_b: Position::new(10, 3),
            ..roomy()
        });

        // Up is pending but Right is still current, so Down is not a reversal
        game.on_key_press(Player::B, Direction::Up);
        game.on_key_press(Player::B, Direction::Down);
        assert_eq!(game.direction(Player::B), Direction::Right);
        assert_eq!(game.next_direction(Player::B), Direction::Down);

        game.advance().unwrap();
        assert_eq!(game.direction(Player::B), Direction::Down);
        assert_eq!(game.snake(Player::B).head(), Position::new(11, 3));

        // Now Up is the reversal
        assert!(!game.on_key_press(Player::B, Direction::Up));
    }

    #[test]
    fn test_head_to_head() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(5, 6),
            spawn_b: Position::new(7, 6),
            ..roomy()
        });
        game.on_key_press(Player::A, Direction::Down);
        game.on_key_press(Player::B, Direction::Up);

        let report = game.advance().unwrap();

        assert!(game.snake(Player::A).is_dead());
        assert!(game.snake(Player::B).is_dead());
        assert!(game.is_over());
        assert_eq!(game.outcome(), Some(Outcome::Draw));
        assert_eq!(
            report.deaths,
            vec![
                (Player::A, CollisionType::HeadToHead),
                (Player::B, CollisionType::HeadToHead),
            ]
        );
    }

    #[test]
    fn test_wall_for_player_a_is_outer_edge() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(0, 7),
            spawn_b: Position::new(5, 2),
            ..GameConfig::new(10, 10)
        });
        game.apple = Apple::new(Position::new(8, 1));

        // Row 0 is safe for A
        let report = game.advance().unwrap();
        assert!(report.deaths.is_empty());
        assert_eq!(game.snake(Player::A).head(), Position::new(0, 8));

        let report = game.advance().unwrap();
        assert_eq!(report.deaths, vec![(Player::A, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::A).head(), Position::new(0, 9));
        assert_eq!(game.outcome(), Some(Outcome::Winner(Player::B)));
    }

    #[test]
    fn test_wall_for_player_b_includes_row_zero() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(0, 0),
            spawn_b: Position::new(2, 5),
            ..roomy()
        });
        game.on_key_press(Player::B, Direction::Up);

        game.advance().unwrap();
        assert!(!game.is_over());
        assert_eq!(game.snake(Player::B).head(), Position::new(1, 5));

        let report = game.advance().unwrap();
        assert_eq!(report.deaths, vec![(Player::B, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::B).head(), Position::new(0, 5));
        // A is on row 0 too and lives
        assert!(!game.snake(Player::A).is_dead());
        assert_eq!(game.outcome(), Some(Outcome::Winner(Player::A)));
    }

    #[test]
    fn test_wall_for_player_a_last_row() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(7, 2),
            spawn_b: Position::new(5, 2),
            ..GameConfig::new(10, 10)
        });
        game.apple = Apple::new(Position::new(1, 8));
        game.on_key_press(Player::A, Direction::Down);

        assert!(game.advance().unwrap().deaths.is_empty());
        let report = game.advance().unwrap();

        assert_eq!(report.deaths, vec![(Player::A, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::A).head(), Position::new(9, 2));
    }

    #[test]
    fn test_player_a_survives_column_zero() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(3, 1),
            spawn_b: Position::new(7, 2),
            ..GameConfig::new(10, 10)
        });
        game.apple = Apple::new(Position::new(1, 8));
        game.on_key_press(Player::A, Direction::Down);
        game.advance().unwrap();
        game.on_key_press(Player::A, Direction::Left);

        let report = game.advance().unwrap();

        assert!(report.deaths.is_empty());
        assert_eq!(game.snake(Player::A).head(), Position::new(4, 0));
    }

    #[test]
    fn test_wall_for_player_b_column_zero() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(0, 0),
            spawn_b: Position::new(5, 2),
            ..GameConfig::new(10, 10)
        });
        game.apple = Apple::new(Position::new(1, 8));
        game.on_key_press(Player::B, Direction::Down);
        game.advance().unwrap();
        game.on_key_press(Player::B, Direction::Left);
        assert!(game.advance().unwrap().deaths.is_empty());
        assert_eq!(game.snake(Player::B).head(), Position::new(6, 1));

        let report = game.advance().unwrap();

        assert_eq!(report.deaths, vec![(Player::B, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::B).head(), Position::new(6, 0));
    }

    #[test]
    fn test_wall_for_player_b_last_column() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(0, 0),
            spawn_b: Position::new(5, 7),
            ..GameConfig::new(10, 10)
        });
        game.apple = Apple::new(Position::new(1, 8));

        assert!(game.advance().unwrap().deaths.is_empty());
        let report = game.advance().unwrap();

        assert_eq!(report.deaths, vec![(Player::B, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::B).head(), Position::new(5, 9));
    }

    #[test]
    fn test_wall_for_player_b_last_row() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(0, 0),
            spawn_b: Position::new(7, 4),
            ..GameConfig::new(10, 10)
        });
        game.apple = Apple::new(Position::new(1, 8));
        game.on_key_press(Player::B, Direction::Down);

        assert!(game.advance().unwrap().deaths.is_empty());
        let report = game.advance().unwrap();

        assert_eq!(report.deaths, vec![(Player::B, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::B).head(), Position::new(9, 4));
        assert_eq!(game.outcome(), Some(Outcome::Winner(Player::A)));
    }

    #[test]
    fn test_negative_col_is_a_wall_death() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(3, 0),
            ..roomy()
        });
        game.on_key_press(Player::A, Direction::Down);
        game.advance().unwrap();
        game.on_key_press(Player::A, Direction::Left);

        let report = game.advance().unwrap();

        assert_eq!(report.deaths, vec![(Player::A, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::A).head(), Position::new(4, 0));
    }

    #[test]
    fn test_negative_move_is_a_wall_death() {
        let mut game = seeded(roomy());
        game.on_key_press(Player::A, Direction::Up);

        let report = game.advance().unwrap();

        assert_eq!(report.deaths, vec![(Player::A, CollisionType::Wall)]);
        assert_eq!(game.snake(Player::A).body(), &[Position::new(0, 0)]);
    }

    #[test]
    fn test_apple_growth_lands_next_tick() {
        let mut game = seeded(GameConfig {
            initial_snake_length: 1,
            ..roomy()
        });
        let target = Position::new(0, 2);
        game.apple = Apple::new(target);

        game.advance().unwrap();
        assert_eq!(game.snake(Player::A).len(), 1);

        let report = game.advance().unwrap();
        assert_eq!(report.eaten, vec![Player::A]);
        assert_eq!(game.snake(Player::A).head(), target);
        assert_eq!(game.snake(Player::A).pending_growth(), 1);
        assert_eq!(game.snake(Player::A).len(), 1);

        game.apple = Apple::new(Position::new(38, 38));
        game.advance().unwrap();
        assert_eq!(game.snake(Player::A).len(), 2);
        assert_eq!(game.snake(Player::A).pending_growth(), 0);
    }

    #[test]
    fn test_apple_is_replaced_from_rng() {
        let mut game = seeded(GameConfig {
            initial_snake_length: 1,
            ..roomy()
        });
        game.apple = Apple::new(Position::new(0, 1));
        let expected = Apple::random(&mut game.rng.clone(), 20);

        let report = game.advance().unwrap();

        assert_eq!(report.eaten, vec![Player::A]);
        assert_eq!(*game.apple(), expected);
    }

    #[test]
    fn test_player_b_checks_the_replacement_apple() {
        // Find a seed whose replacement apple sits away from B's walls
        let (mut game, next) = (0..)
            .map(|seed| {
                let game = Game::with_rng(roomy(), StdRng::seed_from_u64(seed));
                let next = Apple::random(&mut game.rng.clone(), 20).position();
                (game, next)
            })
            .find(|(_, next)| next.row >= 2 && next.col >= 2)
            .unwrap();

        let eaten_by_a = Position::new(next.row + 1, next.col + 2);
        game.snakes = [
            Snake::new(eaten_by_a.offset_col(-1), 1),
            Snake::new(next.offset_row(1), 1),
        ];
        game.steering[1] = Steering::new(Direction::Up);
        game.apple = Apple::new(eaten_by_a);

        let report = game.advance().unwrap();

        assert_eq!(report.eaten, vec![Player::A, Player::B]);
        assert!(report.deaths.is_empty());
        assert_eq!(game.snake(Player::A).pending_growth(), 1);
        assert_eq!(game.snake(Player::B).pending_growth(), 1);
    }

    #[test]
    fn test_head_on_opponent_body_kills_both() {
        let mut game = seeded(GameConfig {
            spawn_a: Position::new(3, 4),
            spawn_b: Position::new(5, 2),
            ..roomy()
        });
        let mut b = Snake::new(Position::new(5, 2), 5);
        for _ in 0..4 {
            b.move_towards(Direction::Right).unwrap();
        }
        game.snakes = [Snake::new(Position::new(3, 4), 1), b];
        game.steering[0] = Steering::new(Direction::Down);

        // A reaches (4,4), B moves to (5,7)
        let report = game.advance().unwrap();
        assert!(report.deaths.is_empty());

        // A lands on (5,4), still part of B's trailing body
        let report = game.advance().unwrap();
        assert_eq!(
            report.deaths,
            vec![(Player::A, CollisionType::Body), (Player::B, CollisionType::Body)]
        );
        assert_eq!(game.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn test_player_b_head_on_opponent_body_kills_both() {
        let mut game = seeded(roomy());
        let mut a = Snake::new(Position::new(5, 2), 5);
        for _ in 0..4 {
            a.move_towards(Direction::Right).unwrap();
        }
        game.snakes = [a, Snake::new(Position::new(3, 4), 1)];
        game.steering[1] = Steering::new(Direction::Down);

        // B reaches (4,4), A moves to (5,7)
        let report = game.advance().unwrap();
        assert!(report.deaths.is_empty());

        // B lands on (5,4), still part of A's trailing body
        let report = game.advance().unwrap();
        assert_eq!(
            report.deaths,
            vec![(Player::A, CollisionType::Body), (Player::B, CollisionType::Body)]
        );
        assert!(game.snake(Player::A).is_dead());
        assert!(game.snake(Player::B).is_dead());
        assert_eq!(game.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn test_advance_after_game_over_fails() {
        let mut game = seeded(roomy());
        game.on_key_press(Player::A, Direction::Up);
        game.advance().unwrap();
        assert!(game.is_over());

        let snakes = game.snakes.clone();
        let apple = game.apple;
        let ticks = game.ticks();

        for _ in 0..3 {
            assert_eq!(game.advance(), Err(GameError::GameOver));
        }

        assert_eq!(game.snakes, snakes);
        assert_eq!(game.apple, apple);
        assert_eq!(game.ticks(), ticks);
    }
}
