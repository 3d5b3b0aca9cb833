//! # Inventory Tests
//!
//! Warehouse sheet parsing and report generation over a synthetic grid.

use storefront_bot::answer_matcher::ReportLookup;
use storefront_bot::errors::SheetError;
use storefront_bot::inventory::{
    Inventory, InventoryReports, LOCATIONS, EMPTY_REPORT, UNKNOWN_CITY, UNKNOWN_MODE,
};
use storefront_bot::sheets::{column_index, SheetGrid};

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: usize = 20;

    fn row(cells: &[&str]) -> Vec<String> {
        let mut row: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        row.resize(WIDTH, String::new());
        row
    }

    fn set(rows: &mut [Vec<String>], address_col: &str, address_row: usize, value: &str) {
        let col = column_index(address_col).unwrap();
        rows[address_row - 1][col] = value.to_string();
    }

    /// Grid with free text on top, the header in row 4 and item rows below
    fn warehouse_grid() -> SheetGrid {
        let mut rows = vec![
            row(&["Остатки на складах"]),
            row(&[]),
            row(&[]),
            row(&[
                "Склад", "Статус", "Название", "Ссылка", "Описание", "Кол", "Картинки",
                "Отзывы по модели", "Цена из наличия", "Прибытие",
            ]),
            row(&["Склад Казань", "В наличии", "Кресло R7", "https://shop/r7", "4D", "2", "https://img/1, https://img/2", "", "15 000", ""]),
            row(&["Склад Казань", "В наличии", "Кресло R7", "https://shop/r7", "4D", "1", "", "", "", ""]),
            row(&["Казань", "В пути", "Стол", "", "дуб", "3", "https://img/3", "", "", "12.10"]),
            row(&["Казань", "Продано", "Шкаф", "", "", "1", "", "", "", ""]),
            row(&["Самара", "В наличии", "Полка", "", "", "0", "", "", "", ""]),
            row(&["Омск", "В наличии", "Диван", "", "", "5", "", "", "", ""]),
            row(&["Новосибирске", "", "Пуф", "", "", "1", "", "", "", ""]),
        ];
        rows.resize(20, row(&[]));
        set(&mut rows, "N", 2, "Привет, Казань!");
        set(&mut rows, "N", 3, "Ждём вас");
        set(&mut rows, "N", 18, "Свежий отчёт.");
        set(&mut rows, "N", 19, "Спасибо!");
        SheetGrid::from_rows(rows)
    }

    #[test]
    fn test_parse_skips_unusable_rows() {
        let inventory = Inventory::from_grid(&warehouse_grid()).unwrap();
        let kazan = inventory.stock(&LOCATIONS[0]).unwrap();

        assert_eq!(kazan.available.len(), 2);
        assert_eq!(kazan.on_the_way.len(), 1);
        assert_eq!(inventory.item_count(), 3);
        assert!(inventory.stock(&LOCATIONS[2]).unwrap().available.is_empty());

        assert_eq!(kazan.available[0].images, vec!["https://img/1", "https://img/2"]);
        assert_eq!(kazan.available[0].price_available, "15 000");
        assert_eq!(kazan.intro, "Привет, Казань!");
        assert_eq!(kazan.outro, "Ждём вас");
        assert_eq!(inventory.begin_text, "Свежий отчёт.");
        assert_eq!(inventory.finish_text, "Спасибо!");
    }

    #[test]
    fn test_missing_header_row() {
        let grid = SheetGrid::from_rows(vec![row(&["Название", "Кол"])]);
        assert!(matches!(
            Inventory::from_grid(&grid),
            Err(SheetError::MissingHeader(_))
        ));
    }

    #[test]
    fn test_report_deduplicates_lines() {
        let inventory = Inventory::from_grid(&warehouse_grid()).unwrap();
        let report = inventory.report("Казань", "Наличии");

        assert_eq!(report, "<a href='https://shop/r7'>Кресло R7</a> 4D");
    }

    #[test]
    fn test_report_on_the_way_includes_arrival() {
        let inventory = Inventory::from_grid(&warehouse_grid()).unwrap();
        assert_eq!(inventory.report("казань", "В пути"), "Стол дуб\nПрибытие 12.10");
    }

    #[test]
    fn test_report_edge_cases() {
        let inventory = Inventory::from_grid(&warehouse_grid()).unwrap();

        assert_eq!(inventory.report("Омск", "Наличии"), UNKNOWN_CITY);
        assert_eq!(inventory.report("Казань", "Продано"), UNKNOWN_MODE);
        assert_eq!(inventory.report("Самара", "Наличии"), EMPTY_REPORT);
        // Variant detection also resolves inflected city names
        assert_eq!(inventory.report("Новосибирске", "В пути"), EMPTY_REPORT);
    }

    #[test]
    fn test_reports_snapshot_swap() {
        let reports = InventoryReports::default();
        assert_eq!(reports.get_report("Казань", "Наличии").unwrap(), EMPTY_REPORT);

        reports.replace(Inventory::from_grid(&warehouse_grid()).unwrap());
        assert!(reports
            .get_report("Казань", "Наличии")
            .unwrap()
            .contains("Кресло R7"));
    }

    #[test]
    fn test_publication_uses_caption_with_photos() {
        let inventory = Inventory::from_grid(&warehouse_grid()).unwrap();
        let kazan = inventory.stock(&LOCATIONS[0]).unwrap();
        let messages = kazan.publication(&LOCATIONS[0]);

        assert_eq!(messages.photos.len(), 3);
        let caption = messages.caption.unwrap();
        assert!(caption.starts_with(r"*Отчёт по складу \(Казань\)"));
        assert!(caption.contains(r"*Наличие:*"));
        assert!(caption.contains(r"[Кресло R7](https://shop/r7) 4D Цена 15 000"));
        assert!(caption.ends_with("Ждём вас"));
        assert!(messages.texts.is_empty());
    }
}
