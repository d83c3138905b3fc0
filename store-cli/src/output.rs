use store_client::margin::MarginSummary;
use store_client::models::{
    BoardCategory, BusinessStatus, Comment, NewsArticle, Post, Recipe, Report, User,
};
use store_client::sales::SalesSummary;

pub(crate) fn print_user(title: &str, user: &User) {
    println!("{title}");
    println!("user_id: {}", user.user_id);
    println!("name: {}", user.name);
    println!("phone: {}", user.phone);
    println!("store: {}", user.store_name);
    if let Some(number) = &user.business_number {
        println!("business_number: {number}");
    }
    if let Some(created_at) = user.created_at {
        println!("created_at: {created_at}");
    }
}

pub(crate) fn print_categories(categories: &[BoardCategory]) {
    for category in categories {
        println!("- [{}] {}", category.id, category.name);
    }
}

pub(crate) fn print_posts<'a>(
    posts: impl IntoIterator<Item = &'a Post>,
    liked: impl Fn(i64) -> bool,
) {
    let mut count = 0usize;
    for post in posts {
        count += 1;
        let heart = if liked(post.id) { "♥" } else { " " };
        println!(
            "- [{}] ({}) {} {heart}{} comments={} by {}",
            post.id, post.category, post.title, post.like_count, post.comment_count, post.user_id
        );
    }
    println!("Постов: {count}");
}

pub(crate) fn print_post(title: &str, post: &Post, comments: &[Comment]) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("category: {}", post.category);
    println!("title: {}", post.title);
    println!("author: {}", post.user_id);
    println!("likes: {}, views: {}", post.like_count, post.view_count);
    println!("created_at: {}", post.created_at);
    println!();
    println!("{}", post.content);
    if !comments.is_empty() {
        println!();
        println!("Комментарии ({}):", comments.len());
        for comment in comments {
            println!("- [{}] {}: {}", comment.id, comment.user_id, comment.content);
        }
    }
}

pub(crate) fn print_recipes(recipes: &[Recipe]) {
    for recipe in recipes {
        println!("- [{}] {}: {}", recipe.id, recipe.name, recipe.price);
    }
    println!("Рецептов: {}", recipes.len());
}

pub(crate) fn print_recipe(recipe: &Recipe) {
    println!("[{}] {}: цена {}", recipe.id, recipe.name, recipe.price);
    for ingredient in &recipe.ingredients {
        println!(
            "  - [{}] {} {}{} = {}",
            ingredient.id, ingredient.name, ingredient.quantity, ingredient.unit, ingredient.cost
        );
    }
    let cost = recipe.ingredient_cost();
    println!(
        "себестоимость {cost}, маржа {} ({}%), фудкост {}%",
        store_client::margin::margin(recipe.price, cost),
        store_client::margin::margin_rate(recipe.price, cost),
        store_client::margin::cost_rate(recipe.price, cost),
    );
}

pub(crate) fn print_margin(summary: &MarginSummary) {
    for line in &summary.lines {
        println!(
            "- [{}] {}: цена {}, себестоимость {}, маржа {} ({}%)",
            line.recipe_id,
            line.name,
            line.price,
            line.ingredient_cost,
            line.margin,
            line.margin_rate
        );
    }
    println!(
        "Итого: цена {}, себестоимость {}, маржа {} ({}%)",
        summary.total_price, summary.total_cost, summary.total_margin, summary.overall_margin_rate
    );
    if let (Some(best), Some(worst)) = (summary.best(), summary.worst()) {
        println!("Лучшая маржа: {} ({}%)", best.name, best.margin_rate);
        println!("Худшая маржа: {} ({}%)", worst.name, worst.margin_rate);
    }
    for line in summary.unprofitable() {
        println!("! {} продаётся в убыток: {}", line.name, line.margin);
    }
}

pub(crate) fn print_reports(reports: &[Report]) {
    for report in reports {
        println!(
            "- [{}] {} {} x{} = {}{}",
            report.id,
            report.sale_date,
            report.menu_name,
            report.quantity,
            report.amount,
            if report.memo.is_empty() {
                String::new()
            } else {
                format!(" ({})", report.memo)
            }
        );
    }
    println!("Записей: {}", reports.len());
}

pub(crate) fn print_sales(summary: &SalesSummary) {
    println!(
        "Выручка: {} (продано {}, в среднем {} в день)",
        summary.total_revenue,
        summary.total_quantity,
        summary.average_daily_revenue()
    );
    println!("По позициям:");
    for menu in &summary.by_menu {
        println!(
            "  - {}: {} x{} ({}%)",
            menu.menu_name, menu.revenue, menu.quantity, menu.share
        );
    }
    println!("По дням:");
    for day in &summary.by_day {
        println!("  - {}: {} x{}", day.date, day.revenue, day.quantity);
    }
}

pub(crate) fn print_news(articles: &[NewsArticle]) {
    for article in articles {
        println!("- {} ({})", article.title, article.published_at);
        println!("  {}", article.link);
    }
    println!("Новостей: {}", articles.len());
}

pub(crate) fn print_business(status: &BusinessStatus) {
    println!("business_number: {}", status.business_number);
    println!("state: {:?}", status.state());
    if !status.status_text.is_empty() {
        println!("status: {}", status.status_text);
    }
    if !status.tax_type.is_empty() {
        println!("tax_type: {}", status.tax_type);
    }
    if let Some(closed_at) = &status.closed_at {
        println!("closed_at: {closed_at}");
    }
}
