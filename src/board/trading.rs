//! The neighbourhood market.
//!
//! A customer only deals with the machines on the six tiles around it.

use tracing::{trace, warn};

use super::BoardState;
use crate::hex::HexFacing;
use crate::hex::flags::is_bot_on_tile;
use crate::machine::{Quote, TradeRequest, TradeType};

impl BoardState {
    pub(super) fn handle_trade_request(&mut self, request: &TradeRequest) {
        if request.trade_type == TradeType::Buying {
            self.handle_trade_transaction(request);
        } else {
            self.handle_trade_query(request);
        }
    }

    fn neighbour_quotes(&self, request: &TradeRequest) -> Vec<Quote> {
        let Some(customer) = self.machine(request.customer) else {
            return Vec::new();
        };
        let xy = customer.board_xy();
        HexFacing::ALL
            .iter()
            .filter_map(|&f| self.grid.try_get_neighbour_tile(xy, f))
            .filter(|&n| self.grid.is_on_board(n) && is_bot_on_tile(self.grid.contents(n)))
            .filter_map(|n| self.machine_at(n))
            .filter_map(|seller| seller.get_trade_quote(request))
            .collect()
    }

    // Buy from the cheapest seller first until the order is filled.
    fn handle_trade_transaction(&mut self, request: &TradeRequest) {
        if self.machine(request.customer).is_none() {
            warn!(machine = %request.customer, "trade from a machine no longer on the board");
            return;
        }
        let mut quotes = self.neighbour_quotes(request);
        quotes.sort();
        let mut sold = 0u16;
        for quote in quotes {
            let wanted = request.quantity - sold;
            if wanted == 0 {
                break;
            }
            if let Some((seller, buyer)) = self.machine_pair_mut(quote.seller, request.customer) {
                sold += seller.sell_goods_to(buyer, request.commodity, wanted);
            }
        }
        trace!(machine = %request.customer, commodity = request.commodity.name(), sold, "purchase settled");
        if let Some(buyer) = self.machine_mut(request.customer) {
            buyer.trade_reply(sold);
        }
    }

    fn handle_trade_query(&mut self, request: &TradeRequest) {
        let answer = self.neighbour_quotes(request).into_iter().min().map_or(0, |q| {
            if request.trade_type == TradeType::QueryPrice { q.price } else { q.availability }
        });
        if let Some(customer) = self.machine_mut(request.customer) {
            customer.trade_reply(answer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::FrameEvents;
    use crate::hex::flags::OFF_BOARD;
    use crate::hex::{GameHexGrid, HexCoord, HexGrid};
    use crate::machine::tests::create_test_template;
    use crate::machine::{Machine, MachineId};
    use crate::tradables::{Amount, TradableType};

    fn create_test_board() -> BoardState {
        let grid = GameHexGrid::new(HexGrid::new(12, 12, 0, OFF_BOARD).unwrap()).unwrap();
        BoardState::new(3, grid, Vec::new(), Vec::new()).unwrap()
    }

    fn create_test_seller(board: &mut BoardState, xy: HexCoord, metals: i16, price: u16) -> MachineId {
        let mut m = Machine::create_machine(create_test_template(&format!("for_sale( 4, {metals}, {price} )\ngoto 2"))).unwrap();
        assert!(m.cargo_mut().try_add_cargo(&Amount::of(TradableType::Metals, metals)));
        board.add_machine_to_board(xy, HexFacing::Tile0, m).unwrap()
    }

    fn run(board: &mut BoardState) {
        let mut events = FrameEvents::default();
        board.advance_one_frame(&[], &mut events);
    }

    #[test]
    fn test_distant_sellers_are_ignored() {
        let mut board = create_test_board();
        create_test_seller(&mut board, HexCoord::new(5, 8), 10, 1);
        let customer = Machine::create_machine(create_test_template("goto 1")).unwrap();
        let customer = board.add_machine_to_board(HexCoord::new(5, 5), HexFacing::Tile0, customer).unwrap();
        run(&mut board);
        let request = TradeRequest {
            customer,
            trade_type: TradeType::QueryAvailability,
            commodity: TradableType::Metals,
            quantity: 0,
            price_limit: 0,
        };
        assert!(board.neighbour_quotes(&request).is_empty());
    }

    #[test]
    fn test_availability_comes_from_the_cheapest_seller() {
        let mut board = create_test_board();
        create_test_seller(&mut board, HexCoord::new(5, 4), 8, 5);
        create_test_seller(&mut board, HexCoord::new(5, 6), 3, 2);
        let mut asker = Machine::create_machine(create_test_template("goto 1")).unwrap();
        asker.give_credits(1);
        let asker = board.add_machine_to_board(HexCoord::new(5, 5), HexFacing::Tile0, asker).unwrap();
        run(&mut board);
        let request = TradeRequest {
            customer: asker,
            trade_type: TradeType::QueryAvailability,
            commodity: TradableType::Metals,
            quantity: 0,
            price_limit: 0,
        };
        let best = board.neighbour_quotes(&request).into_iter().min().unwrap();
        assert_eq!((best.price, best.availability), (2, 3));
    }

    #[test]
    fn test_purchase_stops_when_filled() {
        let mut board = create_test_board();
        let first = create_test_seller(&mut board, HexCoord::new(5, 4), 10, 1);
        let second = create_test_seller(&mut board, HexCoord::new(5, 6), 10, 2);
        let mut buyer = Machine::create_machine(create_test_template("goto 1")).unwrap();
        buyer.give_credits(50);
        let buyer = board.add_machine_to_board(HexCoord::new(5, 5), HexFacing::Tile0, buyer).unwrap();
        run(&mut board);

        board.handle_trade_request(&TradeRequest {
            customer: buyer,
            trade_type: TradeType::Buying,
            commodity: TradableType::Metals,
            quantity: 4,
            price_limit: u16::MAX,
        });
        assert_eq!(board.machine(buyer).unwrap().cargo().count_of(TradableType::Metals), 4);
        assert_eq!(board.machine(first).unwrap().credits(), 4);
        assert_eq!(board.machine(second).unwrap().credits(), 0);
    }

    #[test]
    fn test_higher_limit_buys_scarce_stock_first() {
        let mut board = create_test_board();
        let seller = create_test_seller(&mut board, HexCoord::new(5, 5), 5, 10);
        let mut customers = Vec::new();
        for xy in [HexCoord::new(5, 4), HexCoord::new(5, 6)] {
            let mut buyer = Machine::create_machine(create_test_template("goto 1")).unwrap();
            buyer.give_credits(100);
            customers.push(board.add_machine_to_board(xy, HexFacing::Tile0, buyer).unwrap());
        }
        run(&mut board);

        let (low, high) = (customers[0], customers[1]);
        for (customer, price_limit) in [(low, 10), (high, 12)] {
            board.trades.push(TradeRequest {
                customer,
                trade_type: TradeType::Buying,
                commodity: TradableType::Metals,
                quantity: 5,
                price_limit,
            });
        }
        run(&mut board);

        let winner = board.machine(high).unwrap();
        assert_eq!(winner.cargo().count_of(TradableType::Metals), 5);
        assert_eq!(winner.credits(), 50);
        let loser = board.machine(low).unwrap();
        assert_eq!(loser.cargo().count_of(TradableType::Metals), 0);
        assert_eq!(loser.credits(), 100);
        assert_eq!(board.machine(seller).unwrap().credits(), 50);
    }
}
